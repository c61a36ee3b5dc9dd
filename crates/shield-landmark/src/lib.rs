//! Biometric Shield Landmarks
//!
//! Synthetic faces as STATE, not pixels. Nothing here looks at a camera.
//!
//! # Pipeline
//!
//! Region table → generator → landmark set → jitter engine → new snapshot
//!
//! The generator is pure and deterministic; the jitter engine is the only
//! source of randomness and takes its random source by injection so a
//! seeded run replays exactly.

pub mod face;
pub mod jitter;
pub mod palette;
pub mod region;

pub use face::*;
pub use jitter::*;
pub use palette::*;
pub use region::*;
