use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::anim::AnimTimings;
use crate::domain::PokemonId;
use crate::error::DexError;
use crate::fetch::DEFAULT_FLOOR;
use crate::pokeapi::DEFAULT_BASE_URL;

pub const DEFAULT_CONFIG_PATH: &str = "termdex.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub default_pokemon: Option<String>,
    #[serde(default)]
    pub starters: Option<Vec<String>>,
    #[serde(default)]
    pub timings: Option<TimingsEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TimingsEntry {
    #[serde(default)]
    pub min_loading_ms: Option<u64>,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub reveal_ms: Option<u64>,
    #[serde(default)]
    pub squash_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub default_pokemon: PokemonId,
    pub starters: Vec<PokemonId>,
    pub floor: Duration,
    pub anim: AnimTimings,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DexError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_PATH),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DexError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DexError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, DexError> {
        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let default_pokemon = config
            .default_pokemon
            .unwrap_or_else(|| "pikachu".to_string())
            .parse()?;

        let raw_starters = config.starters.unwrap_or_else(default_starters);
        if raw_starters.is_empty() {
            return Err(DexError::ConfigParse(
                "starters must not be empty".to_string(),
            ));
        }
        let starters = raw_starters
            .iter()
            .map(|value| value.parse())
            .collect::<Result<Vec<_>, DexError>>()?;
        if starters
            .iter()
            .enumerate()
            .any(|(index, id)| starters[..index].contains(id))
        {
            return Err(DexError::ConfigParse(
                "starters must not contain duplicates".to_string(),
            ));
        }

        let timings = config.timings.unwrap_or_default();
        let defaults = AnimTimings::default();
        let anim = AnimTimings {
            progress: duration_ms(timings.progress_ms, defaults.progress),
            reveal: duration_ms(timings.reveal_ms, defaults.reveal),
            squash: duration_ms(timings.squash_ms, defaults.squash),
        };

        Ok(ResolvedConfig {
            base_url,
            default_pokemon,
            starters,
            floor: duration_ms(timings.min_loading_ms, DEFAULT_FLOOR),
            anim,
        })
    }
}

pub fn default_starters() -> Vec<String> {
    vec![
        "bulbasaur".to_string(),
        "charmander".to_string(),
        "squirtle".to_string(),
    ]
}

fn duration_ms(value: Option<u64>, default: Duration) -> Duration {
    value.map(Duration::from_millis).unwrap_or(default)
}
