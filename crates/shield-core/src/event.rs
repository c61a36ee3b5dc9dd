//! Event definitions
//!
//! Events are the only channel from the engine to its collaborators: the
//! renderer listens for landmark and counter changes, the router listens
//! for transition requests. Every event carries the stage it belongs to.

use serde::{Deserialize, Serialize};

use crate::{CounterId, LandmarkSet, SimTime, StageId};

/// Sub-state of a stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    /// Dashboard waiting for the user to activate the shield
    Idle,
    /// Dashboard acknowledged activation, hand-off pending
    Acknowledging,
    /// Stage without sub-states
    Running,
    /// Obfuscation stage before the defense goes live
    Initializing,
    /// Obfuscation stage with jitter running
    Active,
}

impl StagePhase {
    /// Phase a stage starts in
    pub fn initial(stage: StageId) -> Self {
        match stage {
            StageId::Dashboard => StagePhase::Idle,
            StageId::ChaosEngine => StagePhase::Initializing,
            StageId::Calibration | StageId::StatusReport => StagePhase::Running,
        }
    }
}

/// Notification emitted by the engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShieldEvent {
    /// A stage became active; visuals should mount
    StageEntered { stage: StageId },
    /// A stage was torn down; visuals should unmount
    StageExited { stage: StageId },
    /// Fire-and-forget request to the routing collaborator
    TransitionRequested { from: StageId, to: StageId },
    PhaseChanged { stage: StageId, phase: StagePhase },
    /// New landmark snapshot (generation or jitter tick)
    LandmarksChanged { stage: StageId, landmarks: LandmarkSet },
    CounterChanged {
        stage: StageId,
        counter: CounterId,
        value: u32,
    },
}

impl ShieldEvent {
    /// Stage identity the event is tagged with
    ///
    /// A transition request is tagged with its destination: it is the
    /// first thing emitted on behalf of the incoming stage.
    pub fn stage(&self) -> StageId {
        match self {
            ShieldEvent::StageEntered { stage }
            | ShieldEvent::StageExited { stage }
            | ShieldEvent::PhaseChanged { stage, .. }
            | ShieldEvent::LandmarksChanged { stage, .. }
            | ShieldEvent::CounterChanged { stage, .. } => *stage,
            ShieldEvent::TransitionRequested { to, .. } => *to,
        }
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ShieldEvent::StageEntered { .. } => "stage_entered",
            ShieldEvent::StageExited { .. } => "stage_exited",
            ShieldEvent::TransitionRequested { .. } => "transition_requested",
            ShieldEvent::PhaseChanged { .. } => "phase_changed",
            ShieldEvent::LandmarksChanged { .. } => "landmarks_changed",
            ShieldEvent::CounterChanged { .. } => "counter_changed",
        }
    }
}

/// Receiver of engine notifications
pub trait EventSink {
    fn emit(&mut self, at: SimTime, event: ShieldEvent);
}

impl EventSink for Vec<(SimTime, ShieldEvent)> {
    fn emit(&mut self, at: SimTime, event: ShieldEvent) {
        self.push((at, event));
    }
}

/// Adapter turning a closure into a sink
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: FnMut(SimTime, ShieldEvent),
{
    fn emit(&mut self, at: SimTime, event: ShieldEvent) {
        (self.0)(at, event)
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, at: SimTime, event: ShieldEvent) {
        (**self).emit(at, event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, at: SimTime, event: ShieldEvent) {
        (**self).emit(at, event)
    }
}
