//! Action Fuzzer - random user input against the scheduler
//!
//! Interleaves activate, restart, forced navigation and clock advances
//! drawn from a seeded source, then checks the recorded history. Leaked
//! timers show up as events tagged with an exited stage.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use shield_core::{ShieldResult, StageId};

use crate::{InvariantReport, StageSimulator};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of actions to apply
    pub action_count: usize,
    /// Probability of a forced navigation per action
    pub navigate_prob: f64,
    /// Probability of a user action (activate / restart) per action
    pub press_prob: f64,
    /// Longest single clock advance, milliseconds
    pub max_advance_ms: u64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            action_count: 500,
            navigate_prob: 0.1,
            press_prob: 0.3,
            max_advance_ms: 2_000,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            action_count: 100,
            ..Self::default()
        }
    }

    /// Navigation-heavy run: stages rarely live long enough to finish
    pub fn hostile() -> Self {
        FuzzerConfig {
            action_count: 1_000,
            navigate_prob: 0.5,
            press_prob: 0.3,
            max_advance_ms: 300,
            seed: 42,
        }
    }
}

/// One applied action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuzzAction {
    Activate,
    Restart,
    Navigate(StageId),
    Advance(Duration),
}

/// Result of a fuzzing run
#[derive(Clone, Debug, Default)]
pub struct FuzzResult {
    pub actions: usize,
    pub navigations: usize,
    pub accepted_presses: usize,
    pub invariants: InvariantReport,
}

impl FuzzResult {
    pub fn is_valid(&self) -> bool {
        self.invariants.is_valid()
    }
}

/// Random action driver
pub struct ActionFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
    sim: StageSimulator,
    log: Vec<FuzzAction>,
}

impl ActionFuzzer {
    pub fn new(config: FuzzerConfig) -> ShieldResult<Self> {
        let sim = StageSimulator::new(config.seed)?;
        Ok(ActionFuzzer {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            sim,
            log: Vec::new(),
        })
    }

    fn next_action(&mut self) -> FuzzAction {
        let roll: f64 = self.rng.gen();
        if roll < self.config.navigate_prob {
            let index = self.rng.gen_range(0..StageId::ALL.len());
            FuzzAction::Navigate(StageId::ALL[index])
        } else if roll < self.config.navigate_prob + self.config.press_prob {
            if self.rng.gen_bool(0.5) {
                FuzzAction::Activate
            } else {
                FuzzAction::Restart
            }
        } else {
            let ms = self.rng.gen_range(1..=self.config.max_advance_ms.max(1));
            FuzzAction::Advance(Duration::from_millis(ms))
        }
    }

    pub fn run(&mut self) -> ShieldResult<FuzzResult> {
        let mut result = FuzzResult::default();

        for _ in 0..self.config.action_count {
            let action = self.next_action();
            match action {
                FuzzAction::Activate => {
                    if self.sim.activate() {
                        result.accepted_presses += 1;
                    }
                }
                FuzzAction::Restart => {
                    if self.sim.restart()? {
                        result.accepted_presses += 1;
                    }
                }
                FuzzAction::Navigate(stage) => {
                    self.sim.navigate(stage)?;
                    result.navigations += 1;
                }
                FuzzAction::Advance(delta) => self.sim.run_for(delta)?,
            }
            self.log.push(action);
            result.actions += 1;
        }

        result.invariants = self.sim.check();
        Ok(result)
    }

    /// Actions applied so far, for reproducing a failure
    pub fn log(&self) -> &[FuzzAction] {
        &self.log
    }

    pub fn simulator(&self) -> &StageSimulator {
        &self.sim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzer_light() {
        let mut fuzzer = ActionFuzzer::new(FuzzerConfig::light()).unwrap();
        let result = fuzzer.run().unwrap();
        assert_eq!(result.actions, 100);
        assert!(result.is_valid(), "{:?}", result.invariants.violations);
        assert_eq!(fuzzer.simulator().stats().stale_events_dropped, 0);
    }

    #[test]
    fn test_fuzzer_hostile() {
        let mut fuzzer = ActionFuzzer::new(FuzzerConfig::hostile()).unwrap();
        let result = fuzzer.run().unwrap();
        assert!(result.navigations > 0);
        assert!(result.is_valid(), "{:?}", result.invariants.violations);
    }

    #[test]
    fn test_fuzzer_is_reproducible() {
        let run = || {
            let mut fuzzer = ActionFuzzer::new(FuzzerConfig::light()).unwrap();
            fuzzer.run().unwrap();
            fuzzer.log().to_vec()
        };
        assert_eq!(run(), run());
    }
}
