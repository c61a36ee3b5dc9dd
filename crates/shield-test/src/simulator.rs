//! Stage Simulator - fast-forward harness around the scheduler
//!
//! Simulates:
//! - A user pressing activate / restart at chosen times
//! - Forced navigation from the router
//! - Long stretches of simulated time in one call

use std::time::Duration;

use shield_core::{ShieldError, ShieldResult, SimTime, StageId};
use shield_runtime::{ScriptConfig, SchedulerStats, StageScheduler};

use crate::{check_history, InvariantReport, RecordingSink};

/// Upper bound used when waiting for a stage that never arrives
pub const DEFAULT_WAIT_LIMIT: Duration = Duration::from_secs(120);

/// Scheduler wired to a recording sink
pub struct StageSimulator {
    scheduler: StageScheduler<RecordingSink>,
}

impl StageSimulator {
    /// Default script with a fixed seed
    pub fn new(seed: u64) -> ShieldResult<Self> {
        Self::with_config(ScriptConfig::default(), seed)
    }

    pub fn with_config(config: ScriptConfig, seed: u64) -> ShieldResult<Self> {
        Ok(StageSimulator {
            scheduler: StageScheduler::seeded(config, seed, RecordingSink::new())?,
        })
    }

    pub fn scheduler(&self) -> &StageScheduler<RecordingSink> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut StageScheduler<RecordingSink> {
        &mut self.scheduler
    }

    pub fn recording(&self) -> &RecordingSink {
        self.scheduler.sink()
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn stage(&self) -> StageId {
        self.scheduler.stage()
    }

    pub fn stats(&self) -> &SchedulerStats {
        self.scheduler.stats()
    }

    pub fn activate(&mut self) -> bool {
        self.scheduler.activate()
    }

    pub fn restart(&mut self) -> ShieldResult<bool> {
        self.scheduler.restart()
    }

    pub fn navigate(&mut self, stage: StageId) -> ShieldResult<()> {
        self.scheduler.navigate(stage)
    }

    /// Advance by `duration` of simulated time
    pub fn run_for(&mut self, duration: Duration) -> ShieldResult<()> {
        self.scheduler.advance_by(duration)
    }

    /// Step timer by timer until `stage` is active or `limit` elapses
    ///
    /// Returns the entry time, or `None` if the stage was not reached.
    pub fn run_until_stage(
        &mut self,
        stage: StageId,
        limit: Duration,
    ) -> ShieldResult<Option<SimTime>> {
        let deadline = self.now() + limit;
        while self.stage() != stage {
            let Some(next) = self.scheduler.next_due() else {
                return Ok(None);
            };
            if next > deadline {
                self.scheduler.advance_to(deadline)?;
                return Ok(None);
            }
            self.scheduler.advance_to(next)?;
        }
        Ok(Some(self.scheduler.entered_at()))
    }

    /// Activate, then follow the script back to the Dashboard
    pub fn run_cycle(&mut self) -> ShieldResult<CycleTimings> {
        if self.stage() != StageId::Dashboard {
            self.navigate(StageId::Dashboard)?;
        }
        let activated = self.now();
        self.activate();

        let calibration = self.wait_for(StageId::Calibration)?;
        let chaos = self.wait_for(StageId::ChaosEngine)?;
        let report = self.wait_for(StageId::StatusReport)?;

        // Let every report counter settle before restarting
        let settle = self
            .scheduler
            .config()
            .status
            .counters
            .iter()
            .filter_map(|c| c.settles_after())
            .max()
            .unwrap_or_default();
        self.run_for(settle)?;
        self.restart()?;

        Ok(CycleTimings {
            activated,
            calibration,
            chaos,
            report,
            finished: self.now(),
        })
    }

    fn wait_for(&mut self, stage: StageId) -> ShieldResult<SimTime> {
        self.run_until_stage(stage, DEFAULT_WAIT_LIMIT)?
            .ok_or_else(|| ShieldError::InvalidConfig(format!("script never reaches {stage}")))
    }

    /// Check the recorded history against the stage invariants
    pub fn check(&self) -> InvariantReport {
        let amplitude = self.scheduler.config().obfuscation.jitter_amplitude;
        let mut report = check_history(self.recording().events(), amplitude);
        if self.stats().stale_events_dropped > 0 {
            report.violations.push(format!(
                "{} stale timer events reached the scheduler",
                self.stats().stale_events_dropped
            ));
        }
        report
    }
}

/// Stage entry times of one full cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleTimings {
    pub activated: SimTime,
    pub calibration: SimTime,
    pub chaos: SimTime,
    pub report: SimTime,
    pub finished: SimTime,
}

impl CycleTimings {
    pub fn acknowledgement(&self) -> Duration {
        self.calibration - self.activated
    }

    pub fn calibration_dwell(&self) -> Duration {
        self.chaos - self.calibration
    }

    pub fn chaos_dwell(&self) -> Duration {
        self.report - self.chaos
    }
}

/// Predefined starting points
pub mod scenarios {
    use super::*;

    /// Just entered Calibration through activation
    pub fn calibrating(seed: u64) -> ShieldResult<StageSimulator> {
        let mut sim = StageSimulator::new(seed)?;
        sim.activate();
        sim.run_until_stage(StageId::Calibration, DEFAULT_WAIT_LIMIT)?;
        Ok(sim)
    }

    /// Just entered ChaosEngine through the scripted path
    pub fn defending(seed: u64) -> ShieldResult<StageSimulator> {
        let mut sim = calibrating(seed)?;
        sim.run_until_stage(StageId::ChaosEngine, DEFAULT_WAIT_LIMIT)?;
        Ok(sim)
    }

    /// Just entered StatusReport through the scripted path
    pub fn reporting(seed: u64) -> ShieldResult<StageSimulator> {
        let mut sim = defending(seed)?;
        sim.run_until_stage(StageId::StatusReport, DEFAULT_WAIT_LIMIT)?;
        Ok(sim)
    }
}
