//! Biometric Shield Time - bounded tickers on one simulated clock
//!
//! This crate implements the timing layer:
//! - Ticker: bounded counter advancing by a fixed step per interval
//! - CounterAnimator: ticker presets driving displayed metrics
//! - Timeline: virtual-clock timer queue owning tickers, delays and repeats

pub mod counter;
pub mod ticker;
pub mod timeline;

pub use counter::*;
pub use ticker::*;
pub use timeline::*;
