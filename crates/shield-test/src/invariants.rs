//! Invariant checks over a recorded event history
//!
//! Checks:
//! - Simulated time never goes backwards
//! - Every event is tagged with the stage active when it was emitted
//! - Transitions are `StageExited → TransitionRequested → StageEntered`
//! - Bounded counters never decrease within one stage activation
//! - Jittered points stay within the amplitude of their base position

use std::collections::HashMap;

use shield_core::{CounterId, ShieldEvent, SimTime, StageId};

use crate::Recorded;

/// Tolerance on the jitter bound for floating-point noise
const JITTER_EPSILON: f64 = 1e-9;

/// Outcome of an invariant pass
#[derive(Clone, Debug, Default)]
pub struct InvariantReport {
    pub events_checked: usize,
    pub stage_activations: usize,
    pub violations: Vec<String>,
}

impl InvariantReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Walk the history and collect every violation
pub fn check_history(events: &[Recorded], jitter_amplitude: f64) -> InvariantReport {
    let mut report = InvariantReport::default();
    let mut last_at = SimTime::ZERO;
    let mut active: Option<StageId> = None;
    let mut pending: Option<StageId> = None;
    let mut counters: HashMap<CounterId, u32> = HashMap::new();

    for (index, Recorded { at, event }) in events.iter().enumerate() {
        report.events_checked += 1;
        let mut violation = |msg: String| report.violations.push(format!("#{index} at {at}: {msg}"));

        if *at < last_at {
            violation(format!("time went backwards from {last_at}"));
        }
        last_at = *at;

        match event {
            ShieldEvent::StageEntered { stage } => {
                if let Some(current) = active {
                    violation(format!("{stage} entered while {current} still active"));
                }
                if let Some(expected) = pending.take() {
                    if expected != *stage {
                        violation(format!("requested {expected}, entered {stage}"));
                    }
                }
                active = Some(*stage);
                counters.clear();
                report.stage_activations += 1;
            }
            ShieldEvent::StageExited { stage } => {
                if active != Some(*stage) {
                    violation(format!("{stage} exited but active was {active:?}"));
                }
                active = None;
            }
            ShieldEvent::TransitionRequested { to, .. } => {
                if active.is_some() {
                    violation(format!("transition to {to} requested before exit"));
                }
                pending = Some(*to);
            }
            other => {
                if active != Some(other.stage()) {
                    violation(format!(
                        "{} tagged {} while active was {active:?}",
                        other.kind(),
                        other.stage()
                    ));
                }
                match other {
                    ShieldEvent::CounterChanged { counter, value, .. }
                        if *counter != CounterId::ScanLine =>
                    {
                        if let Some(previous) = counters.insert(*counter, *value) {
                            if *value < previous {
                                violation(format!("{counter:?} went from {previous} to {value}"));
                            }
                        }
                    }
                    ShieldEvent::LandmarksChanged { landmarks, .. } => {
                        let bound = jitter_amplitude + JITTER_EPSILON;
                        if let Some(point) = landmarks.iter().find(|p| p.displacement() > bound) {
                            violation(format!("point {point:?} outside jitter bound"));
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    report
}
