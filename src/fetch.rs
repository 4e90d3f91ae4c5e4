use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::{FetchOutcome, PokemonId, PokemonRecord};
use crate::pokeapi::CatalogueClient;

pub const DEFAULT_FLOOR: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub enum FetchPhase {
    Idle,
    AwaitingConfirmation { prior: Box<FetchPhase> },
    InFlight { started: Instant, pending: Option<FetchOutcome> },
    Succeeded(PokemonRecord),
    Failed(String),
}

impl FetchPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            FetchPhase::Idle => PhaseKind::Idle,
            FetchPhase::AwaitingConfirmation { .. } => PhaseKind::AwaitingConfirmation,
            FetchPhase::InFlight { .. } => PhaseKind::InFlight,
            FetchPhase::Succeeded(_) => PhaseKind::Succeeded,
            FetchPhase::Failed(_) => PhaseKind::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    AwaitingConfirmation,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub id: PokemonId,
    pub generation: u64,
}

#[derive(Debug)]
pub struct FetchMessage {
    pub generation: u64,
    pub outcome: FetchOutcome,
}

pub fn spawn_fetch<C: CatalogueClient + 'static>(
    client: Arc<C>,
    ticket: FetchTicket,
    tx: Sender<FetchMessage>,
) {
    thread::spawn(move || {
        let outcome = match client.fetch_pokemon(&ticket.id) {
            Ok(record) => FetchOutcome::Success(record),
            Err(err) => FetchOutcome::Failure(err.to_string()),
        };
        let _ = tx.send(FetchMessage {
            generation: ticket.generation,
            outcome,
        });
    });
}

#[derive(Debug)]
pub struct FetchOrchestrator {
    id: PokemonId,
    floor: Duration,
    phase: FetchPhase,
    generation: u64,
}

impl FetchOrchestrator {
    pub fn new(id: PokemonId, floor: Duration) -> Self {
        Self {
            id,
            floor,
            phase: FetchPhase::Idle,
            generation: 0,
        }
    }

    pub fn id(&self) -> &PokemonId {
        &self.id
    }

    pub fn phase(&self) -> &FetchPhase {
        &self.phase
    }

    pub fn request_confirmation(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, FetchPhase::Idle) {
            prior @ (FetchPhase::Idle | FetchPhase::Succeeded(_) | FetchPhase::Failed(_)) => {
                self.phase = FetchPhase::AwaitingConfirmation {
                    prior: Box::new(prior),
                };
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    pub fn cancel_confirmation(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, FetchPhase::Idle) {
            FetchPhase::AwaitingConfirmation { prior } => {
                self.phase = *prior;
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    pub fn confirm(&mut self, now: Instant) -> Option<FetchTicket> {
        match std::mem::replace(&mut self.phase, FetchPhase::Idle) {
            FetchPhase::AwaitingConfirmation { .. } => {
                self.generation += 1;
                self.phase = FetchPhase::InFlight {
                    started: now,
                    pending: None,
                };
                tracing::debug!(id = %self.id, generation = self.generation, "fetch confirmed");
                Some(FetchTicket {
                    id: self.id.clone(),
                    generation: self.generation,
                })
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    pub fn settle(&mut self, generation: u64, outcome: FetchOutcome) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "stale fetch result discarded"
            );
            return false;
        }
        match &mut self.phase {
            FetchPhase::InFlight { pending, .. } if pending.is_none() => {
                *pending = Some(outcome);
                true
            }
            _ => false,
        }
    }

    pub fn poll(&mut self, now: Instant) -> Option<PhaseKind> {
        let FetchPhase::InFlight { started, pending } = &mut self.phase else {
            return None;
        };
        if pending.is_none() || now.duration_since(*started) < self.floor {
            return None;
        }
        let outcome = pending.take()?;
        self.phase = match outcome {
            FetchOutcome::Success(record) => FetchPhase::Succeeded(record),
            FetchOutcome::Failure(reason) => FetchPhase::Failed(reason),
        };
        let kind = self.phase.kind();
        tracing::debug!(id = %self.id, phase = ?kind, "fetch settled");
        Some(kind)
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.phase {
            FetchPhase::InFlight {
                started,
                pending: Some(_),
            } => Some(*started + self.floor),
            _ => None,
        }
    }
}
