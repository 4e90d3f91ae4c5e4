use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use termdex::app::App;
use termdex::config::ConfigLoader;
use termdex::domain::PokemonId;
use termdex::error::DexError;
use termdex::output::{JsonOutput, OutputMode};
use termdex::pokeapi::PokeApiHttpClient;
use termdex::tui::Tui;

#[derive(Parser)]
#[command(name = "termdex")]
#[command(about = "Terminal pokedex with a confirm-and-fetch detail flow and a starter batch")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch a single pokemon (detail flow)")]
    Fetch(FetchArgs),
    #[command(about = "Fetch the starter batch")]
    Starters,
}

#[derive(Args, Clone)]
struct FetchArgs {
    id: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(dex) = report.downcast_ref::<DexError>() {
                return ExitCode::from(map_exit_code(dex));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &DexError) -> u8 {
    match error {
        DexError::InvalidPokemonId(_) | DexError::ConfigRead(_) | DexError::ConfigParse(_) => 2,
        DexError::CatalogueHttp(_)
        | DexError::CatalogueStatus { .. }
        | DexError::CatalogueParse(_) => 3,
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    let fetch_id = match &cli.command {
        Some(Commands::Fetch(args)) => args
            .id
            .clone()
            .map(|value| value.parse::<PokemonId>())
            .transpose()?,
        _ => None,
    };
    if let Some(id) = &fetch_id {
        config.default_pokemon = id.clone();
    }

    let client = PokeApiHttpClient::new(&config.base_url)?;
    let app = App::new(client, config);

    match (cli.command, output_mode) {
        (Some(Commands::Fetch(_)), OutputMode::NonInteractive) => {
            let report = app.fetch_once(fetch_id.as_ref());
            JsonOutput::print_fetch(&report).into_diagnostic()?;
            if report.succeeded() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(3))
            }
        }
        (Some(Commands::Starters), OutputMode::NonInteractive) => {
            let report = app.fetch_starters();
            JsonOutput::print_starters(&report).into_diagnostic()?;
            if report.all_failed {
                Ok(ExitCode::from(3))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        (None, OutputMode::NonInteractive) => Err(miette::Report::msg(
            "command required with --non-interactive (try `termdex --help`)",
        )),
        (command, OutputMode::Interactive) => {
            let mut tui = Tui::new(app);
            match command {
                Some(Commands::Fetch(_)) => tui.open_detail(),
                Some(Commands::Starters) => tui.open_starters(),
                None => {}
            }
            tui.run()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
