//! Jitter Engine - geometric perturbation of landmark snapshots
//!
//! Each tick redraws every point around its base position. The offset is
//! never accumulated: a point is always within `amplitude` of its base on
//! both axes, however many ticks have run.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use shield_core::{LandmarkSet, ShieldError, ShieldResult};

/// Default per-axis displacement bound (percent)
pub const DEFAULT_AMPLITUDE: f64 = 2.0;

/// Randomized point perturbation with an injected random source
#[derive(Debug, Clone)]
pub struct JitterEngine<R = StdRng> {
    rng: R,
    offset: Uniform<f64>,
    amplitude: f64,
    ticks: u64,
}

impl JitterEngine<StdRng> {
    /// Reproducible engine with the default ±2 amplitude
    pub fn seeded(seed: u64) -> Self {
        Self::build(StdRng::seed_from_u64(seed), DEFAULT_AMPLITUDE)
    }
}

impl<R: Rng> JitterEngine<R> {
    /// Engine with a custom amplitude
    pub fn with_amplitude(rng: R, amplitude: f64) -> ShieldResult<Self> {
        if !amplitude.is_finite() || amplitude < 0.0 {
            return Err(ShieldError::InvalidConfig(format!(
                "jitter amplitude must be finite and non-negative, got {amplitude}"
            )));
        }
        Ok(Self::build(rng, amplitude))
    }

    fn build(rng: R, amplitude: f64) -> Self {
        Self {
            rng,
            offset: Uniform::new_inclusive(-amplitude, amplitude),
            amplitude,
            ticks: 0,
        }
    }

    /// Produce a new snapshot with every point redrawn around its base
    ///
    /// The input snapshot is left untouched.
    pub fn tick(&mut self, landmarks: &LandmarkSet) -> LandmarkSet {
        self.ticks += 1;
        landmarks
            .iter()
            .map(|point| {
                let dx = self.offset.sample(&mut self.rng);
                let dy = self.offset.sample(&mut self.rng);
                point.displaced(point.base_x + dx, point.base_y + dy)
            })
            .collect()
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Number of snapshots produced so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obfuscation_table;
    use proptest::prelude::*;

    #[test]
    fn test_tick_produces_new_snapshot() {
        let base = obfuscation_table().generate();
        let mut engine = JitterEngine::seeded(7);

        let first = engine.tick(&base);
        let second = engine.tick(&first);

        assert!(!first.same_snapshot(&base));
        assert_ne!(first, second);
        // The base snapshot still rests at its reference positions
        assert!(base.iter().all(|p| p.x == p.base_x && p.y == p.base_y));
        assert_eq!(engine.ticks(), 2);
    }

    #[test]
    fn test_same_seed_same_jitter() {
        let base = obfuscation_table().generate();
        let mut a = JitterEngine::seeded(42);
        let mut b = JitterEngine::seeded(42);
        assert_eq!(a.tick(&base), b.tick(&base));
    }

    #[test]
    fn test_zero_amplitude_is_identity() {
        let base = obfuscation_table().generate();
        let mut engine = JitterEngine::with_amplitude(StdRng::seed_from_u64(1), 0.0).unwrap();
        assert_eq!(engine.tick(&base), base);
    }

    #[test]
    fn test_rejects_invalid_amplitude() {
        assert!(JitterEngine::with_amplitude(StdRng::seed_from_u64(1), -1.0).is_err());
        assert!(JitterEngine::with_amplitude(StdRng::seed_from_u64(1), f64::NAN).is_err());
    }

    proptest! {
        #[test]
        fn prop_jitter_stays_within_amplitude(seed in any::<u64>(), ticks in 1usize..30) {
            let base = obfuscation_table().generate();
            let mut engine = JitterEngine::seeded(seed);
            let mut current = base.clone();
            for _ in 0..ticks {
                current = engine.tick(&current);
                for (moved, original) in current.iter().zip(base.iter()) {
                    prop_assert!((moved.x - moved.base_x).abs() <= DEFAULT_AMPLITUDE);
                    prop_assert!((moved.y - moved.base_y).abs() <= DEFAULT_AMPLITUDE);
                    prop_assert_eq!(moved.base_x.to_bits(), original.base_x.to_bits());
                    prop_assert_eq!(moved.base_y.to_bits(), original.base_y.to_bits());
                    prop_assert_eq!(moved.region, original.region);
                }
            }
        }
    }
}
