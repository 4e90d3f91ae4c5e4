use std::sync::Arc;
use std::sync::mpsc;

use serde::Serialize;

use crate::batch::{BatchEntry, BatchOrchestrator, spawn_batch};
use crate::config::ResolvedConfig;
use crate::domain::{FetchOutcome, PokemonId};
use crate::pokeapi::CatalogueClient;

#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub id: String,
    pub status: String,
    pub name: Option<String>,
    pub weight: Option<u64>,
    pub height: Option<u64>,
    pub base_experience: Option<u64>,
    pub sprite: Option<String>,
    pub error: Option<String>,
    pub fetched_at: String,
    pub tool: String,
}

impl FetchReport {
    fn from_outcome(id: &PokemonId, outcome: &FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Success(record) => Self {
                id: id.as_str().to_string(),
                status: "success".to_string(),
                name: Some(record.display_name()),
                weight: Some(record.weight),
                height: Some(record.height),
                base_experience: Some(record.base_experience),
                sprite: record.sprite.clone(),
                error: None,
                fetched_at: iso_timestamp(),
                tool: tool_tag(),
            },
            FetchOutcome::Failure(reason) => Self {
                id: id.as_str().to_string(),
                status: "failure".to_string(),
                name: None,
                weight: None,
                height: None,
                base_experience: None,
                sprite: None,
                error: Some(reason.clone()),
                fetched_at: iso_timestamp(),
                tool: tool_tag(),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartersReport {
    pub entries: Vec<StarterEntryReport>,
    pub all_failed: bool,
    pub error: Option<String>,
    pub fetched_at: String,
    pub tool: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StarterEntryReport {
    pub id: String,
    pub status: String,
    pub name: Option<String>,
    pub error: Option<String>,
}

impl StarterEntryReport {
    fn from_entry(entry: &BatchEntry) -> Self {
        match &entry.outcome {
            FetchOutcome::Success(record) => Self {
                id: entry.id.as_str().to_string(),
                status: "success".to_string(),
                name: Some(record.display_name()),
                error: None,
            },
            FetchOutcome::Failure(reason) => Self {
                id: entry.id.as_str().to_string(),
                status: "failure".to_string(),
                name: None,
                error: Some(reason.clone()),
            },
        }
    }
}

#[derive(Clone)]
pub struct App<C: CatalogueClient> {
    client: Arc<C>,
    config: ResolvedConfig,
}

impl<C: CatalogueClient + 'static> App<C> {
    pub fn new(client: C, config: ResolvedConfig) -> Self {
        Self {
            client: Arc::new(client),
            config,
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn fetch_once(&self, id: Option<&PokemonId>) -> FetchReport {
        let id = id.cloned().unwrap_or_else(|| self.config.default_pokemon.clone());
        tracing::info!(%id, "fetching pokemon");
        let outcome = match self.client.fetch_pokemon(&id) {
            Ok(record) => FetchOutcome::Success(record),
            Err(err) => FetchOutcome::Failure(err.to_string()),
        };
        FetchReport::from_outcome(&id, &outcome)
    }

    pub fn fetch_starters(&self) -> StartersReport {
        let mut batch = BatchOrchestrator::new(self.config.starters.clone());
        let (tx, rx) = mpsc::channel();
        if let Some(tickets) = batch.start() {
            spawn_batch(Arc::clone(&self.client), tickets, tx);
        }
        for message in rx.iter() {
            batch.settle(message.generation, &message.id, message.outcome);
            if batch.result().is_some() {
                break;
            }
        }

        match batch.result() {
            Some(result) => StartersReport {
                entries: result.entries().iter().map(StarterEntryReport::from_entry).collect(),
                all_failed: result.all_failed(),
                error: result.aggregate_error().map(str::to_string),
                fetched_at: iso_timestamp(),
                tool: tool_tag(),
            },
            None => StartersReport {
                entries: self
                    .config
                    .starters
                    .iter()
                    .map(|id| StarterEntryReport {
                        id: id.as_str().to_string(),
                        status: "failure".to_string(),
                        name: None,
                        error: Some("no response from fetch worker".to_string()),
                    })
                    .collect(),
                all_failed: true,
                error: Some(crate::batch::ALL_FAILED_MESSAGE.to_string()),
                fetched_at: iso_timestamp(),
                tool: tool_tag(),
            },
        }
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn tool_tag() -> String {
    format!("termdex/{}", env!("CARGO_PKG_VERSION"))
}
