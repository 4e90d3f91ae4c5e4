use std::time::{Duration, Instant};

use crate::fetch::PhaseKind;

#[derive(Debug, Clone, Copy)]
pub struct AnimTimings {
    pub progress: Duration,
    pub reveal: Duration,
    pub squash: Duration,
}

impl Default for AnimTimings {
    fn default() -> Self {
        Self {
            progress: Duration::from_millis(2000),
            reveal: Duration::from_millis(2000),
            squash: Duration::from_millis(150),
        }
    }
}

#[derive(Debug)]
pub struct AnimationCoordinator {
    timings: AnimTimings,
    progress_started: Option<Instant>,
    reveal_started: Option<Instant>,
    squash_started: Option<Instant>,
}

impl AnimationCoordinator {
    pub fn new(timings: AnimTimings) -> Self {
        Self {
            timings,
            progress_started: None,
            reveal_started: None,
            squash_started: None,
        }
    }

    pub fn phase_changed(&mut self, _from: PhaseKind, to: PhaseKind, now: Instant) {
        match to {
            PhaseKind::AwaitingConfirmation => {
                self.squash_started = Some(now);
            }
            PhaseKind::InFlight => {
                self.progress_started = Some(now);
                self.reveal_started = None;
            }
            PhaseKind::Succeeded => {
                self.progress_started = None;
                self.reveal_started = Some(now);
            }
            PhaseKind::Failed => {
                self.progress_started = None;
            }
            PhaseKind::Idle => {}
        }
    }

    pub fn progress(&self, now: Instant) -> Option<f64> {
        let started = self.progress_started?;
        Some(ratio(started, now, self.timings.progress))
    }

    pub fn reveal(&self, now: Instant) -> f64 {
        match self.reveal_started {
            Some(started) => ratio(started, now, self.timings.reveal),
            None => 0.0,
        }
    }

    pub fn button_scale(&self, now: Instant) -> f64 {
        let Some(started) = self.squash_started else {
            return 1.0;
        };
        let t = ratio(started, now, self.timings.squash);
        if t >= 1.0 {
            return 1.0;
        }
        let dip = if t < 0.5 { t * 2.0 } else { (1.0 - t) * 2.0 };
        1.0 - 0.1 * dip
    }
}

fn ratio(started: Instant, now: Instant, over: Duration) -> f64 {
    if over.is_zero() {
        return 1.0;
    }
    let elapsed = now.duration_since(started);
    (elapsed.as_secs_f64() / over.as_secs_f64()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> AnimationCoordinator {
        AnimationCoordinator::new(AnimTimings::default())
    }

    #[test]
    fn progress_resets_on_each_in_flight_entry() {
        let t0 = Instant::now();
        let mut anim = coordinator();
        assert_eq!(anim.progress(t0), None);

        anim.phase_changed(PhaseKind::AwaitingConfirmation, PhaseKind::InFlight, t0);
        assert_eq!(anim.progress(t0), Some(0.0));
        assert_eq!(anim.progress(t0 + Duration::from_millis(1000)), Some(0.5));
        assert_eq!(anim.progress(t0 + Duration::from_millis(5000)), Some(1.0));

        let t1 = t0 + Duration::from_millis(6000);
        anim.phase_changed(PhaseKind::InFlight, PhaseKind::Succeeded, t1);
        let t2 = t1 + Duration::from_millis(100);
        anim.phase_changed(PhaseKind::AwaitingConfirmation, PhaseKind::InFlight, t2);
        assert_eq!(anim.progress(t2), Some(0.0));
    }

    #[test]
    fn progress_stops_on_failure() {
        let t0 = Instant::now();
        let mut anim = coordinator();
        anim.phase_changed(PhaseKind::AwaitingConfirmation, PhaseKind::InFlight, t0);
        anim.phase_changed(
            PhaseKind::InFlight,
            PhaseKind::Failed,
            t0 + Duration::from_millis(1600),
        );
        assert_eq!(anim.progress(t0 + Duration::from_millis(1700)), None);
    }

    #[test]
    fn reveal_replays_for_every_success() {
        let t0 = Instant::now();
        let mut anim = coordinator();
        assert_eq!(anim.reveal(t0), 0.0);

        anim.phase_changed(PhaseKind::AwaitingConfirmation, PhaseKind::InFlight, t0);
        let t1 = t0 + Duration::from_millis(1500);
        anim.phase_changed(PhaseKind::InFlight, PhaseKind::Succeeded, t1);
        assert_eq!(anim.reveal(t1), 0.0);
        assert_eq!(anim.reveal(t1 + Duration::from_millis(1000)), 0.5);
        assert_eq!(anim.reveal(t1 + Duration::from_millis(3000)), 1.0);

        let t2 = t1 + Duration::from_millis(4000);
        anim.phase_changed(PhaseKind::AwaitingConfirmation, PhaseKind::InFlight, t2);
        assert_eq!(anim.reveal(t2), 0.0);
        let t3 = t2 + Duration::from_millis(1500);
        anim.phase_changed(PhaseKind::InFlight, PhaseKind::Succeeded, t3);
        assert_eq!(anim.reveal(t3), 0.0);
    }

    #[test]
    fn reveal_persists_while_confirmation_overlays_result() {
        let t0 = Instant::now();
        let mut anim = coordinator();
        anim.phase_changed(PhaseKind::AwaitingConfirmation, PhaseKind::InFlight, t0);
        let t1 = t0 + Duration::from_millis(1500);
        anim.phase_changed(PhaseKind::InFlight, PhaseKind::Succeeded, t1);
        let t2 = t1 + Duration::from_millis(3000);
        anim.phase_changed(PhaseKind::Succeeded, PhaseKind::AwaitingConfirmation, t2);
        assert_eq!(anim.reveal(t2), 1.0);
    }

    #[test]
    fn squash_fires_on_gate_opening_press() {
        let t0 = Instant::now();
        let mut anim = coordinator();
        assert_eq!(anim.button_scale(t0), 1.0);

        anim.phase_changed(PhaseKind::Idle, PhaseKind::AwaitingConfirmation, t0);
        assert_eq!(anim.button_scale(t0), 1.0);
        assert!((anim.button_scale(t0 + Duration::from_millis(75)) - 0.9).abs() < 1e-9);
        assert_eq!(anim.button_scale(t0 + Duration::from_millis(150)), 1.0);

        let t1 = t0 + Duration::from_millis(80);
        anim.phase_changed(PhaseKind::AwaitingConfirmation, PhaseKind::InFlight, t1);
        assert_eq!(anim.button_scale(t0 + Duration::from_millis(300)), 1.0);
    }
}
