use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::domain::{FetchOutcome, PokemonId, PokemonRecord};
use crate::fetch::{FetchTicket, PhaseKind};
use crate::pokeapi::CatalogueClient;

pub const ALL_FAILED_MESSAGE: &str = "Failed to load starter Pokémon. Please try again.";

#[derive(Debug)]
pub struct BatchMessage {
    pub generation: u64,
    pub id: PokemonId,
    pub outcome: FetchOutcome,
}

pub fn spawn_batch<C: CatalogueClient + 'static>(
    client: Arc<C>,
    tickets: Vec<FetchTicket>,
    tx: Sender<BatchMessage>,
) {
    for ticket in tickets {
        let client = Arc::clone(&client);
        let tx = tx.clone();
        thread::spawn(move || {
            let outcome = match client.fetch_pokemon(&ticket.id) {
                Ok(record) => FetchOutcome::Success(record),
                Err(err) => FetchOutcome::Failure(err.to_string()),
            };
            let _ = tx.send(BatchMessage {
                generation: ticket.generation,
                id: ticket.id,
                outcome,
            });
        });
    }
}

#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub id: PokemonId,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn get(&self, id: &PokemonId) -> Option<&FetchOutcome> {
        self.entries
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| &entry.outcome)
    }

    pub fn successes(&self) -> impl Iterator<Item = (&PokemonId, &PokemonRecord)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.record().map(|record| (&entry.id, record)))
    }

    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|entry| !entry.outcome.is_success())
    }

    pub fn aggregate_error(&self) -> Option<&'static str> {
        self.all_failed().then_some(ALL_FAILED_MESSAGE)
    }

    pub fn phase_kind(&self) -> PhaseKind {
        if self.all_failed() {
            PhaseKind::Failed
        } else {
            PhaseKind::Succeeded
        }
    }
}

#[derive(Debug, Clone)]
pub enum BatchPhase {
    Loading { slots: Vec<Option<FetchOutcome>> },
    Ready(BatchResult),
}

#[derive(Debug)]
pub struct BatchOrchestrator {
    ids: Vec<PokemonId>,
    generation: u64,
    phase: BatchPhase,
}

impl BatchOrchestrator {
    pub fn new(ids: Vec<PokemonId>) -> Self {
        let slots = ids.iter().map(|_| None).collect();
        Self {
            ids,
            generation: 0,
            phase: BatchPhase::Loading { slots },
        }
    }

    pub fn ids(&self) -> &[PokemonId] {
        &self.ids
    }

    pub fn phase(&self) -> &BatchPhase {
        &self.phase
    }

    pub fn start(&mut self) -> Option<Vec<FetchTicket>> {
        if self.generation != 0 {
            return None;
        }
        self.generation = 1;
        tracing::debug!(count = self.ids.len(), "starter batch started");
        Some(
            self.ids
                .iter()
                .map(|id| FetchTicket {
                    id: id.clone(),
                    generation: self.generation,
                })
                .collect(),
        )
    }

    pub fn settle(&mut self, generation: u64, id: &PokemonId, outcome: FetchOutcome) -> bool {
        if generation != self.generation || self.generation == 0 {
            tracing::debug!(
                generation,
                current = self.generation,
                "stale batch result discarded"
            );
            return false;
        }
        let BatchPhase::Loading { slots } = &mut self.phase else {
            return false;
        };
        let Some(index) = self
            .ids
            .iter()
            .zip(slots.iter())
            .position(|(known, slot)| known == id && slot.is_none())
        else {
            tracing::debug!(%id, "batch result with no open slot discarded");
            return false;
        };
        slots[index] = Some(outcome);
        if slots.iter().all(Option::is_some) {
            let entries = self
                .ids
                .iter()
                .zip(slots.iter_mut())
                .filter_map(|(id, slot)| {
                    slot.take().map(|outcome| BatchEntry {
                        id: id.clone(),
                        outcome,
                    })
                })
                .collect();
            self.phase = BatchPhase::Ready(BatchResult { entries });
            tracing::debug!("starter batch ready");
        }
        true
    }

    pub fn result(&self) -> Option<&BatchResult> {
        match &self.phase {
            BatchPhase::Ready(result) => Some(result),
            BatchPhase::Loading { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SelectionState {
    selected: Option<PokemonId>,
}

impl SelectionState {
    pub fn select(&mut self, result: &BatchResult, id: &PokemonId) -> bool {
        match result.get(id) {
            Some(FetchOutcome::Success(_)) => {
                self.selected = Some(id.clone());
                true
            }
            _ => false,
        }
    }

    pub fn selected_id(&self) -> Option<&PokemonId> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, id: &PokemonId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    pub fn current<'a>(
        &self,
        result: &'a BatchResult,
    ) -> Option<(&'a PokemonId, &'a PokemonRecord)> {
        let selected = self.selected.as_ref()?;
        result
            .entries()
            .iter()
            .find(|entry| &entry.id == selected)
            .and_then(|entry| entry.outcome.record().map(|record| (&entry.id, record)))
    }
}
