//! Stage context - everything a stage owns while it is active
//!
//! A context is created on entry and dropped on exit. It records every
//! timer handle the stage started so exit can cancel all of them.

use std::collections::BTreeMap;

use shield_core::{CounterId, LandmarkSet, SimTime, StageId, StagePhase, TimerId};

/// Purpose of a scheduled timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerRole {
    /// Counter animator tick
    Counter(CounterId),
    /// Jitter refresh while the defense is active
    Jitter,
    /// Dashboard acknowledgement delay
    Acknowledge,
    /// Delay between calibration completion and the next stage
    Handoff,
    /// Obfuscation `Initializing → Active` delay
    Arming,
    /// Obfuscation stage dwell
    Dwell,
}

/// Owner tag attached to every timer
///
/// `epoch` identifies the stage activation that scheduled the timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub epoch: u64,
    pub role: TimerRole,
}

/// State owned by the active stage
#[derive(Debug, Clone)]
pub struct StageContext {
    stage: StageId,
    epoch: u64,
    entered_at: SimTime,
    phase: StagePhase,
    timers: Vec<TimerId>,
    /// Timer whose completion ends the stage, if any
    gate: Option<TimerId>,
    /// Reference landmarks as generated on entry
    base: Option<LandmarkSet>,
    /// Latest snapshot handed to the renderer
    landmarks: Option<LandmarkSet>,
    counters: BTreeMap<CounterId, u32>,
}

impl StageContext {
    pub fn new(stage: StageId, epoch: u64, entered_at: SimTime) -> Self {
        StageContext {
            stage,
            epoch,
            entered_at,
            phase: StagePhase::initial(stage),
            timers: Vec::new(),
            gate: None,
            base: None,
            landmarks: None,
            counters: BTreeMap::new(),
        }
    }

    pub fn stage(&self) -> StageId {
        self.stage
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn entered_at(&self) -> SimTime {
        self.entered_at
    }

    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: StagePhase) {
        self.phase = phase;
    }

    /// Key for a timer owned by this activation
    pub fn key(&self, role: TimerRole) -> TimerKey {
        TimerKey {
            epoch: self.epoch,
            role,
        }
    }

    /// Remember a timer handle for teardown
    pub fn track(&mut self, id: TimerId) {
        self.timers.push(id);
    }

    /// Drop a handle whose timer already finished
    pub fn forget(&mut self, id: TimerId) {
        self.timers.retain(|t| *t != id);
    }

    pub fn timers(&self) -> &[TimerId] {
        &self.timers
    }

    /// Hand over every tracked handle, leaving none behind
    pub fn take_timers(&mut self) -> Vec<TimerId> {
        std::mem::take(&mut self.timers)
    }

    /// Mark the timer whose completion schedules the hand-off
    pub fn set_gate(&mut self, id: TimerId) {
        self.gate = Some(id);
    }

    pub fn is_gate(&self, id: TimerId) -> bool {
        self.gate == Some(id)
    }

    /// Install the generated set; it is both base and current snapshot
    pub fn set_base_landmarks(&mut self, landmarks: LandmarkSet) {
        self.landmarks = Some(landmarks.clone());
        self.base = Some(landmarks);
    }

    pub fn set_landmarks(&mut self, landmarks: LandmarkSet) {
        self.landmarks = Some(landmarks);
    }

    pub fn base_landmarks(&self) -> Option<&LandmarkSet> {
        self.base.as_ref()
    }

    pub fn landmarks(&self) -> Option<&LandmarkSet> {
        self.landmarks.as_ref()
    }

    pub fn set_counter(&mut self, counter: CounterId, value: u32) {
        self.counters.insert(counter, value);
    }

    pub fn counter(&self, counter: CounterId) -> Option<u32> {
        self.counters.get(&counter).copied()
    }

    pub fn counters(&self) -> &BTreeMap<CounterId, u32> {
        &self.counters
    }
}
