//! Script configuration
//!
//! The demonstration runs on fixed parameters; `ScriptConfig::default()` is
//! the only script the demo ships. The struct exists so every timing
//! constant lives in one place and so tests can build edge cases.

use std::time::Duration;

use shield_core::{ShieldError, ShieldResult};
use shield_landmark::DEFAULT_AMPLITUDE;
use shield_time::{CounterAnimator, TickerMode};

/// Dashboard timing
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    /// Delay between activation and the calibration hand-off
    pub acknowledge_delay: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            acknowledge_delay: Duration::from_millis(1500),
        }
    }
}

/// Calibration timing
#[derive(Clone, Debug)]
pub struct CalibrationConfig {
    /// Gate counter: its completion schedules the hand-off
    pub progress: CounterAnimator,
    pub reveal: CounterAnimator,
    pub scan_line: CounterAnimator,
    /// Delay between progress completion and the next stage
    pub handoff_delay: Duration,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            progress: CounterAnimator::CALIBRATION_PROGRESS,
            reveal: CounterAnimator::LANDMARKS_REVEALED,
            scan_line: CounterAnimator::SCAN_LINE,
            handoff_delay: Duration::from_millis(500),
        }
    }
}

/// Obfuscation stage timing
#[derive(Clone, Debug)]
pub struct ObfuscationConfig {
    pub identifiers: CounterAnimator,
    /// Dwell in `Initializing` before jitter starts
    pub arming_delay: Duration,
    /// Jitter refresh period (10 updates/second)
    pub jitter_interval: Duration,
    /// Per-axis jitter bound, percent
    pub jitter_amplitude: f64,
    /// Time from stage entry to the status report
    pub dwell: Duration,
}

impl Default for ObfuscationConfig {
    fn default() -> Self {
        ObfuscationConfig {
            identifiers: CounterAnimator::CHAOS_IDENTIFIERS,
            arming_delay: Duration::from_millis(1000),
            jitter_interval: Duration::from_millis(100),
            jitter_amplitude: DEFAULT_AMPLITUDE,
            dwell: Duration::from_millis(8000),
        }
    }
}

/// Status report counters
#[derive(Clone, Debug)]
pub struct StatusConfig {
    pub counters: Vec<CounterAnimator>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        StatusConfig {
            counters: vec![
                CounterAnimator::REPORT_IDENTIFIERS,
                CounterAnimator::REPORT_THREATS,
                CounterAnimator::REPORT_DATA_POINTS,
                CounterAnimator::REPORT_UPTIME,
            ],
        }
    }
}

/// Complete script of the demonstration
#[derive(Clone, Debug, Default)]
pub struct ScriptConfig {
    pub dashboard: DashboardConfig,
    pub calibration: CalibrationConfig,
    pub obfuscation: ObfuscationConfig,
    pub status: StatusConfig,
}

impl ScriptConfig {
    /// Reject scripts the scheduler cannot run to completion
    pub fn validate(&self) -> ShieldResult<()> {
        let counters = [
            &self.calibration.progress,
            &self.calibration.reveal,
            &self.calibration.scan_line,
            &self.obfuscation.identifiers,
        ]
        .into_iter()
        .chain(self.status.counters.iter());

        for animator in counters {
            animator.spec.validate().map_err(|err| {
                ShieldError::InvalidConfig(format!("counter {:?}: {err}", animator.counter))
            })?;
        }

        if self.calibration.progress.spec.mode != TickerMode::Bounded {
            return Err(ShieldError::InvalidConfig(
                "calibration progress must be a bounded counter".into(),
            ));
        }
        if self.obfuscation.jitter_interval.as_millis() == 0 {
            return Err(ShieldError::InvalidConfig(
                "jitter interval must be at least 1ms".into(),
            ));
        }
        if !self.obfuscation.jitter_amplitude.is_finite() || self.obfuscation.jitter_amplitude < 0.0
        {
            return Err(ShieldError::InvalidConfig(format!(
                "jitter amplitude must be finite and non-negative, got {}",
                self.obfuscation.jitter_amplitude
            )));
        }
        let calibration = [
            &self.calibration.progress,
            &self.calibration.reveal,
            &self.calibration.scan_line,
        ];
        distinct_counters("calibration", calibration)?;
        distinct_counters("status", &self.status.counters)?;
        Ok(())
    }
}

/// A stage keys its counter values by id; two animators may not share one
fn distinct_counters<'a>(
    stage: &str,
    animators: impl IntoIterator<Item = &'a CounterAnimator>,
) -> ShieldResult<()> {
    let mut seen = Vec::new();
    for animator in animators {
        if seen.contains(&animator.counter) {
            return Err(ShieldError::InvalidConfig(format!(
                "{stage} counter {:?} listed twice",
                animator.counter
            )));
        }
        seen.push(animator.counter);
    }
    Ok(())
}
