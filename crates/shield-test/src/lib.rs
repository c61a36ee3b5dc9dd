//! Biometric Shield Test Harness - simulation and stage validation
//!
//! This crate provides:
//! - Event recording for scheduler runs
//! - Fast-forward simulation with predefined scenarios
//! - Invariant checks over recorded histories
//! - Random action fuzzing
//! - End-to-end stage scenarios

pub mod action_fuzzer;
pub mod invariants;
pub mod recorder;
pub mod simulator;

#[cfg(test)]
mod scenario_tests;

pub use action_fuzzer::*;
pub use invariants::*;
pub use recorder::*;
pub use simulator::*;
