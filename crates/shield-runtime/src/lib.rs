//! Biometric Shield Runtime - stage scheduling
//!
//! This crate sequences the four-stage demonstration:
//! 1. Dashboard waits for activation
//! 2. Calibration reveals the generated landmarks while progress climbs
//! 3. ChaosEngine arms, then jitters the landmarks until its dwell ends
//! 4. StatusReport animates the final metrics until restart
//!
//! The scheduler runs on a simulated clock; callers decide how simulated
//! time maps to wall time.

pub mod config;
pub mod narrative;
pub mod scheduler;
pub mod stage;
pub mod telemetry;

pub use config::*;
pub use narrative::*;
pub use scheduler::*;
pub use stage::*;
pub use telemetry::*;
