//! Identity types for the shield engine
//!
//! Stages and counters are closed sets, so they are plain enums. Timer
//! handles are 64-bit and never reused within one timeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ShieldError;

/// One of the four stages of the scripted demonstration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Dashboard,
    Calibration,
    ChaosEngine,
    StatusReport,
}

impl StageId {
    /// All stages in narrative order
    pub const ALL: [StageId; 4] = [
        StageId::Dashboard,
        StageId::Calibration,
        StageId::ChaosEngine,
        StageId::StatusReport,
    ];

    /// The stage that follows this one in the cyclic narrative
    pub fn next(self) -> StageId {
        match self {
            StageId::Dashboard => StageId::Calibration,
            StageId::Calibration => StageId::ChaosEngine,
            StageId::ChaosEngine => StageId::StatusReport,
            StageId::StatusReport => StageId::Dashboard,
        }
    }

    /// Route path understood by the routing collaborator
    pub fn path(self) -> &'static str {
        match self {
            StageId::Dashboard => "/",
            StageId::Calibration => "/calibration",
            StageId::ChaosEngine => "/chaos-engine",
            StageId::StatusReport => "/status",
        }
    }

    /// Resolve a route path back to its stage
    pub fn from_path(path: &str) -> Option<StageId> {
        StageId::ALL.into_iter().find(|stage| stage.path() == path)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageId::Dashboard => "dashboard",
            StageId::Calibration => "calibration",
            StageId::ChaosEngine => "chaos_engine",
            StageId::StatusReport => "status_report",
        };
        f.write_str(name)
    }
}

impl FromStr for StageId {
    type Err = ShieldError;

    /// Accepts either the stage name or its route path
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(stage) = StageId::from_path(s) {
            return Ok(stage);
        }
        StageId::ALL
            .into_iter()
            .find(|stage| stage.to_string() == s)
            .ok_or_else(|| ShieldError::UnknownStage(s.to_string()))
    }
}

/// Displayed metric driven by a counter animator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterId {
    /// Calibration progress bar (percent)
    CalibrationProgress,
    /// Number of landmarks revealed so far
    LandmarksRevealed,
    /// Vertical position of the scanning line (percent, wraps)
    ScanLine,
    IdentifiersObfuscated,
    ThreatsBlocked,
    DataPointsProtected,
    /// Uptime percentage
    Uptime,
}

impl CounterId {
    /// Upper-case label shown next to the value
    pub fn label(self) -> &'static str {
        match self {
            CounterId::CalibrationProgress => "CALIBRATION PROGRESS",
            CounterId::LandmarksRevealed => "LANDMARKS DETECTED",
            CounterId::ScanLine => "SCAN LINE",
            CounterId::IdentifiersObfuscated => "IDENTIFIERS OBFUSCATED",
            CounterId::ThreatsBlocked => "THREATS BLOCKED",
            CounterId::DataPointsProtected => "DATA POINTS PROTECTED",
            CounterId::Uptime => "UPTIME",
        }
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Timer handle - unique within a timeline
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TimerId(pub u64);

impl TimerId {
    #[inline]
    pub fn new(id: u64) -> Self {
        TimerId(id)
    }
}

impl fmt::Debug for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timer({})", self.0)
    }
}
