//! Ticker - bounded counter advanced once per interval
//!
//! INVARIANT: `min <= value <= max` at all times.
//! A bounded ticker completes exactly once, on the tick that reaches `max`,
//! and never advances again. A wrapping ticker never completes.

use std::time::Duration;

use shield_core::{ShieldError, ShieldResult};

/// What happens when the value reaches `max`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickerMode {
    /// Clamp to `max` and complete
    Bounded,
    /// Wrap back into `[min, max)` and keep going until cancelled
    Wrapping,
}

/// Ticker parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickerSpec {
    pub min: u32,
    pub max: u32,
    pub step: u32,
    pub interval: Duration,
    pub mode: TickerMode,
}

impl TickerSpec {
    /// Bounded ticker `min → max`
    pub const fn bounded(min: u32, max: u32, step: u32, interval_ms: u64) -> Self {
        TickerSpec {
            min,
            max,
            step,
            interval: Duration::from_millis(interval_ms),
            mode: TickerMode::Bounded,
        }
    }

    /// Wrapping ticker cycling through `[min, max)`
    pub const fn wrapping(min: u32, max: u32, step: u32, interval_ms: u64) -> Self {
        TickerSpec {
            min,
            max,
            step,
            interval: Duration::from_millis(interval_ms),
            mode: TickerMode::Wrapping,
        }
    }

    /// Reject parameters the ticker cannot honor
    pub fn validate(&self) -> ShieldResult<()> {
        if self.min > self.max {
            return Err(ShieldError::InvalidTicker(format!(
                "min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if self.step == 0 {
            return Err(ShieldError::InvalidTicker("step must be positive".into()));
        }
        if self.interval.as_millis() == 0 {
            return Err(ShieldError::InvalidTicker(
                "interval must be at least 1ms".into(),
            ));
        }
        if self.mode == TickerMode::Wrapping && self.min == self.max {
            return Err(ShieldError::InvalidTicker(
                "wrapping ticker needs a non-empty range".into(),
            ));
        }
        Ok(())
    }

    /// Ticks a bounded ticker needs to complete; `None` when it never does
    pub fn ticks_to_complete(&self) -> Option<u64> {
        match self.mode {
            TickerMode::Wrapping => None,
            TickerMode::Bounded => {
                let span = u64::from(self.max - self.min);
                let step = u64::from(self.step.max(1));
                Some(span.div_ceil(step).max(1))
            }
        }
    }

    /// Simulated time from start to completion
    pub fn time_to_complete(&self) -> Option<Duration> {
        let ticks = u32::try_from(self.ticks_to_complete()?).ok()?;
        self.interval.checked_mul(ticks)
    }
}

/// Result of one elapsed interval
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Value moved, ticker keeps running
    Advanced(u32),
    /// Value reached `max`; no further ticks
    Completed(u32),
}

impl TickOutcome {
    pub fn value(self) -> u32 {
        match self {
            TickOutcome::Advanced(v) | TickOutcome::Completed(v) => v,
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(self, TickOutcome::Completed(_))
    }
}

/// Bounded counter primitive underlying every timed animation
#[derive(Clone, Debug)]
pub struct Ticker {
    spec: TickerSpec,
    value: u32,
    running: bool,
    completed: bool,
    ticks: u64,
}

impl Ticker {
    /// Create a ticker resting at `min`
    pub fn new(spec: TickerSpec) -> ShieldResult<Self> {
        spec.validate()?;
        Ok(Ticker {
            value: spec.min,
            spec,
            running: true,
            completed: false,
            ticks: 0,
        })
    }

    /// Apply one elapsed interval
    ///
    /// Returns `None` once the ticker has completed or been cancelled.
    pub fn advance(&mut self) -> Option<TickOutcome> {
        if !self.running {
            return None;
        }
        self.ticks += 1;

        match self.spec.mode {
            TickerMode::Bounded => {
                self.value = self.value.saturating_add(self.spec.step).min(self.spec.max);
                if self.value == self.spec.max {
                    self.running = false;
                    self.completed = true;
                    Some(TickOutcome::Completed(self.value))
                } else {
                    Some(TickOutcome::Advanced(self.value))
                }
            }
            TickerMode::Wrapping => {
                let span = u64::from(self.spec.max - self.spec.min);
                let offset = u64::from(self.value - self.spec.min) + u64::from(self.spec.step);
                // offset % span < span <= u32::MAX
                self.value = self.spec.min + (offset % span) as u32;
                Some(TickOutcome::Advanced(self.value))
            }
        }
    }

    /// Stop the ticker; idempotent, never completes afterwards
    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn spec(&self) -> &TickerSpec {
        &self.spec
    }

    pub fn interval(&self) -> Duration {
        self.spec.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reached `max` and completed
    pub fn is_terminal(&self) -> bool {
        self.completed
    }

    /// Intervals applied so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
