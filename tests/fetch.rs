use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;

use termdex::domain::{FetchOutcome, PokemonId, PokemonRecord};
use termdex::error::DexError;
use termdex::fetch::{FetchOrchestrator, FetchPhase, PhaseKind, spawn_fetch};
use termdex::pokeapi::CatalogueClient;

fn pid(value: &str) -> PokemonId {
    value.parse().unwrap()
}

fn record(name: &str) -> PokemonRecord {
    PokemonRecord {
        name: name.to_string(),
        weight: 60,
        height: 4,
        base_experience: 112,
        sprite: None,
    }
}

fn floor() -> Duration {
    Duration::from_millis(1500)
}

#[test]
fn confirmation_gate_must_open_before_fetch() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), floor());
    let t0 = Instant::now();

    assert_matches!(machine.phase(), FetchPhase::Idle);
    assert!(machine.confirm(t0).is_none());
    assert_matches!(machine.phase(), FetchPhase::Idle);

    assert!(machine.request_confirmation());
    assert_matches!(machine.phase(), FetchPhase::AwaitingConfirmation { .. });

    let ticket = machine.confirm(t0).unwrap();
    assert_eq!(ticket.generation, 1);
    assert_eq!(ticket.id.as_str(), "pikachu");
    assert_matches!(machine.phase(), FetchPhase::InFlight { .. });
}

#[test]
fn cancel_restores_the_displayed_state() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), Duration::ZERO);
    let t0 = Instant::now();

    machine.request_confirmation();
    assert!(machine.cancel_confirmation());
    assert_matches!(machine.phase(), FetchPhase::Idle);

    machine.request_confirmation();
    let ticket = machine.confirm(t0).unwrap();
    assert!(machine.settle(ticket.generation, FetchOutcome::Success(record("pikachu"))));
    assert_eq!(machine.poll(t0), Some(PhaseKind::Succeeded));

    machine.request_confirmation();
    assert_matches!(machine.phase(), FetchPhase::AwaitingConfirmation { .. });
    assert!(machine.cancel_confirmation());
    assert_matches!(machine.phase(), FetchPhase::Succeeded(found) if found.name == "pikachu");
}

#[test]
fn rapid_double_request_keeps_single_gate() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), floor());
    assert!(machine.request_confirmation());
    assert!(!machine.request_confirmation());
    assert_matches!(machine.phase(), FetchPhase::AwaitingConfirmation { .. });

    assert!(machine.cancel_confirmation());
    assert_matches!(machine.phase(), FetchPhase::Idle);
    assert!(!machine.cancel_confirmation());
}

#[test]
fn in_flight_rejects_new_requests() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), floor());
    machine.request_confirmation();
    let t0 = Instant::now();
    machine.confirm(t0).unwrap();

    assert!(!machine.request_confirmation());
    assert!(machine.confirm(t0 + Duration::from_millis(10)).is_none());
    assert_matches!(machine.phase(), FetchPhase::InFlight { .. });
}

#[test]
fn fast_success_waits_for_loading_floor() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), floor());
    machine.request_confirmation();
    let t0 = Instant::now();
    let ticket = machine.confirm(t0).unwrap();

    assert!(machine.settle(ticket.generation, FetchOutcome::Success(record("pikachu"))));
    assert_eq!(machine.deadline(), Some(t0 + floor()));

    assert_eq!(machine.poll(t0 + Duration::from_millis(200)), None);
    assert_matches!(machine.phase(), FetchPhase::InFlight { .. });
    assert_eq!(machine.poll(t0 + Duration::from_millis(1499)), None);
    assert_eq!(
        machine.poll(t0 + Duration::from_millis(1500)),
        Some(PhaseKind::Succeeded)
    );
    assert_matches!(machine.phase(), FetchPhase::Succeeded(_));
}

#[test]
fn slow_failure_lands_once_it_arrives() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), floor());
    machine.request_confirmation();
    let t0 = Instant::now();
    let ticket = machine.confirm(t0).unwrap();

    assert_eq!(machine.poll(t0 + Duration::from_millis(3000)), None);
    assert!(machine.settle(
        ticket.generation,
        FetchOutcome::Failure("network error: connection refused".to_string())
    ));
    assert_eq!(
        machine.poll(t0 + Duration::from_millis(3000)),
        Some(PhaseKind::Failed)
    );
    assert_matches!(machine.phase(), FetchPhase::Failed(reason) if reason.contains("network error"));

    assert!(machine.request_confirmation());
    assert_matches!(machine.phase(), FetchPhase::AwaitingConfirmation { .. });
}

#[test]
fn failure_respects_the_loading_floor_too() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), floor());
    machine.request_confirmation();
    let t0 = Instant::now();
    let ticket = machine.confirm(t0).unwrap();

    assert!(machine.settle(
        ticket.generation,
        FetchOutcome::Failure("network error: timed out".to_string())
    ));
    assert_eq!(machine.poll(t0 + Duration::from_millis(400)), None);
    assert_matches!(machine.phase(), FetchPhase::InFlight { .. });
    assert_eq!(
        machine.poll(t0 + Duration::from_millis(1500)),
        Some(PhaseKind::Failed)
    );
}

#[test]
fn deadline_requires_a_parked_outcome() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), floor());
    assert_eq!(machine.deadline(), None);

    machine.request_confirmation();
    let t0 = Instant::now();
    let ticket = machine.confirm(t0).unwrap();
    assert_eq!(machine.deadline(), None);

    machine.settle(ticket.generation, FetchOutcome::Success(record("pikachu")));
    assert_eq!(machine.deadline(), Some(t0 + floor()));

    machine.poll(t0 + floor());
    assert_eq!(machine.deadline(), None);
}

#[test]
fn stale_results_are_discarded() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), Duration::ZERO);
    machine.request_confirmation();
    let t0 = Instant::now();
    let first = machine.confirm(t0).unwrap();

    assert!(!machine.settle(first.generation + 1, FetchOutcome::Success(record("mew"))));
    assert!(machine.settle(first.generation, FetchOutcome::Success(record("pikachu"))));
    assert!(!machine.settle(
        first.generation,
        FetchOutcome::Failure("late duplicate".to_string())
    ));
    assert_eq!(machine.poll(t0), Some(PhaseKind::Succeeded));

    machine.request_confirmation();
    let second = machine.confirm(t0 + Duration::from_millis(10)).unwrap();
    assert_eq!(second.generation, first.generation + 1);
    assert!(!machine.settle(first.generation, FetchOutcome::Failure("stale".to_string())));
    assert!(machine.settle(second.generation, FetchOutcome::Success(record("raichu"))));
    assert_eq!(
        machine.poll(t0 + Duration::from_millis(10)),
        Some(PhaseKind::Succeeded)
    );
    assert_matches!(machine.phase(), FetchPhase::Succeeded(found) if found.name == "raichu");
    assert!(!machine.settle(second.generation, FetchOutcome::Success(record("mew"))));
}

struct StubClient {
    fail: bool,
}

impl CatalogueClient for StubClient {
    fn fetch_pokemon(&self, id: &PokemonId) -> Result<PokemonRecord, DexError> {
        if self.fail {
            Err(DexError::CatalogueHttp("connection reset".to_string()))
        } else {
            Ok(record(id.as_str()))
        }
    }
}

#[test]
fn worker_thread_settles_through_the_channel() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), Duration::ZERO);
    machine.request_confirmation();
    let ticket = machine.confirm(Instant::now()).unwrap();

    let (tx, rx) = mpsc::channel();
    spawn_fetch(Arc::new(StubClient { fail: false }), ticket, tx);

    let message = rx.recv().unwrap();
    assert!(machine.settle(message.generation, message.outcome));
    assert_eq!(machine.poll(Instant::now()), Some(PhaseKind::Succeeded));
    assert_matches!(machine.phase(), FetchPhase::Succeeded(found) if found.name == "pikachu");
}

#[test]
fn worker_failure_becomes_failed_state() {
    let mut machine = FetchOrchestrator::new(pid("pikachu"), Duration::ZERO);
    machine.request_confirmation();
    let ticket = machine.confirm(Instant::now()).unwrap();

    let (tx, rx) = mpsc::channel();
    spawn_fetch(Arc::new(StubClient { fail: true }), ticket, tx);

    let message = rx.recv().unwrap();
    assert_matches!(&message.outcome, FetchOutcome::Failure(reason) if reason.contains("network error"));
    assert!(machine.settle(message.generation, message.outcome));
    assert_eq!(machine.poll(Instant::now()), Some(PhaseKind::Failed));
}
