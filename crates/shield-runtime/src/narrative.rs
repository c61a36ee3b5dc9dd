//! Narrative text shown alongside each stage

use shield_core::{StageId, StagePhase};

/// Dashboard threat gauge, percent
pub const THREAT_LEVEL: u32 = 85;

/// Dashboard threat gauge label
pub const THREAT_LABEL: &str = "HIGH RISK";

/// Headline of a stage
pub fn stage_title(stage: StageId) -> &'static str {
    match stage {
        StageId::Dashboard => "BIOMETRIC SHIELD",
        StageId::Calibration => "FACIAL CALIBRATION",
        StageId::ChaosEngine => "MOVING TARGET DEFENSE",
        StageId::StatusReport => "DATA PROTECTED",
    }
}

/// Calibration status line for a progress percentage
pub fn calibration_status(progress: u32) -> &'static str {
    match progress {
        0..=29 => "Initializing facial recognition matrix...",
        30..=59 => "Mapping biometric data points...",
        60..=89 => "Computing geometric variations...",
        _ => "Calibration complete. Initializing defense system...",
    }
}

/// Obfuscation stage status banner
pub fn defense_status(phase: StagePhase) -> &'static str {
    match phase {
        StagePhase::Active => "DEFENSE ACTIVE",
        _ => "INITIALIZING",
    }
}
