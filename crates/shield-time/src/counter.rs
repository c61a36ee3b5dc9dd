//! Counter animators - tickers driving displayed metrics
//!
//! Every metric owns its own ticker with its own step, interval and
//! target, so metrics started together finish at different times.

use std::time::Duration;

use shield_core::{CounterId, ShieldResult};

use crate::{Ticker, TickerSpec};

/// A displayed metric and the ticker parameters animating it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterAnimator {
    pub counter: CounterId,
    pub spec: TickerSpec,
}

impl CounterAnimator {
    /// Calibration progress bar, percent
    pub const CALIBRATION_PROGRESS: CounterAnimator =
        CounterAnimator::new(CounterId::CalibrationProgress, TickerSpec::bounded(0, 100, 1, 50));

    /// Progressive reveal of the 68 calibration landmarks
    pub const LANDMARKS_REVEALED: CounterAnimator =
        CounterAnimator::new(CounterId::LandmarksRevealed, TickerSpec::bounded(0, 68, 1, 70));

    /// Scanning line sweep, wraps until the stage exits
    pub const SCAN_LINE: CounterAnimator =
        CounterAnimator::new(CounterId::ScanLine, TickerSpec::wrapping(0, 100, 2, 20));

    /// Live identifier counter while the defense runs
    pub const CHAOS_IDENTIFIERS: CounterAnimator =
        CounterAnimator::new(CounterId::IdentifiersObfuscated, TickerSpec::bounded(0, 342, 7, 50));

    pub const REPORT_IDENTIFIERS: CounterAnimator =
        CounterAnimator::new(CounterId::IdentifiersObfuscated, TickerSpec::bounded(0, 342, 17, 50));

    pub const REPORT_THREATS: CounterAnimator =
        CounterAnimator::new(CounterId::ThreatsBlocked, TickerSpec::bounded(0, 27, 1, 100));

    pub const REPORT_DATA_POINTS: CounterAnimator =
        CounterAnimator::new(CounterId::DataPointsProtected, TickerSpec::bounded(0, 68, 3, 70));

    pub const REPORT_UPTIME: CounterAnimator =
        CounterAnimator::new(CounterId::Uptime, TickerSpec::bounded(0, 100, 1, 30));

    pub const fn new(counter: CounterId, spec: TickerSpec) -> Self {
        CounterAnimator { counter, spec }
    }

    /// Build the ticker for one run of this counter
    pub fn ticker(&self) -> ShieldResult<Ticker> {
        Ticker::new(self.spec)
    }

    /// When the counter settles, measured from its start
    pub fn settles_after(&self) -> Option<Duration> {
        self.spec.time_to_complete()
    }

    /// Fraction of the way from `min` to `max` for a displayed value
    pub fn fraction(&self, value: u32) -> f64 {
        let span = self.spec.max.saturating_sub(self.spec.min);
        if span == 0 {
            return 1.0;
        }
        let done = value.clamp(self.spec.min, self.spec.max) - self.spec.min;
        f64::from(done) / f64::from(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for animator in [
            CounterAnimator::CALIBRATION_PROGRESS,
            CounterAnimator::LANDMARKS_REVEALED,
            CounterAnimator::SCAN_LINE,
            CounterAnimator::CHAOS_IDENTIFIERS,
            CounterAnimator::REPORT_IDENTIFIERS,
            CounterAnimator::REPORT_THREATS,
            CounterAnimator::REPORT_DATA_POINTS,
            CounterAnimator::REPORT_UPTIME,
        ] {
            assert!(animator.ticker().is_ok(), "{animator:?}");
        }
    }

    #[test]
    fn test_report_metrics_settle_at_different_times() {
        let settle: Vec<_> = [
            CounterAnimator::REPORT_IDENTIFIERS,
            CounterAnimator::REPORT_THREATS,
            CounterAnimator::REPORT_DATA_POINTS,
            CounterAnimator::REPORT_UPTIME,
        ]
        .iter()
        .map(|a| a.settles_after().unwrap().as_millis())
        .collect();

        // 21 x 50, 27 x 100, 23 x 70, 100 x 30
        assert_eq!(settle, vec![1050, 2700, 1610, 3000]);
    }

    #[test]
    fn test_progress_settles_after_five_seconds() {
        assert_eq!(
            CounterAnimator::CALIBRATION_PROGRESS.settles_after(),
            Some(Duration::from_millis(5000))
        );
        assert_eq!(CounterAnimator::SCAN_LINE.settles_after(), None);
    }

    #[test]
    fn test_fraction() {
        let progress = CounterAnimator::CALIBRATION_PROGRESS;
        assert_eq!(progress.fraction(0), 0.0);
        assert_eq!(progress.fraction(50), 0.5);
        assert_eq!(progress.fraction(500), 1.0);
    }
}
