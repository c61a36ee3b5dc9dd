//! Biometric Shield Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the shield workspace:
//! - Identifiers (StageId, CounterId, TimerId)
//! - Simulated time (SimTime)
//! - Landmark data model (Region, LandmarkPoint, LandmarkSet)
//! - Events emitted towards rendering and routing collaborators
//! - Error type for contract violations

pub mod id;
pub mod time;
pub mod event;
pub mod landmark;
pub mod error;

pub use id::*;
pub use time::*;
pub use event::*;
pub use landmark::*;
pub use error::*;
