//! Recording sink - captures every emitted event for later inspection

use shield_core::{CounterId, EventSink, LandmarkSet, ShieldEvent, SimTime, StageId, StagePhase};

/// One captured event
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub at: SimTime,
    pub event: ShieldEvent,
}

/// Sink keeping the full event history
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Vec<Recorded>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, at: SimTime, event: ShieldEvent) {
        self.events.push(Recorded { at, event });
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Recorded] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events strictly after `at`
    pub fn after(&self, at: SimTime) -> impl Iterator<Item = &Recorded> + '_ {
        self.events.iter().filter(move |r| r.at > at)
    }

    /// Events recorded from index `start` on
    pub fn since_index(&self, start: usize) -> &[Recorded] {
        &self.events[start.min(self.events.len())..]
    }

    /// Times at which `stage` was entered
    pub fn entries(&self, stage: StageId) -> Vec<SimTime> {
        self.events
            .iter()
            .filter(|r| r.event == ShieldEvent::StageEntered { stage })
            .map(|r| r.at)
            .collect()
    }

    /// Times at which `stage` was exited
    pub fn exits(&self, stage: StageId) -> Vec<SimTime> {
        self.events
            .iter()
            .filter(|r| r.event == ShieldEvent::StageExited { stage })
            .map(|r| r.at)
            .collect()
    }

    /// Every value a counter took, with its time
    pub fn counter_values(&self, counter: CounterId) -> Vec<(SimTime, u32)> {
        self.events
            .iter()
            .filter_map(|r| match r.event {
                ShieldEvent::CounterChanged {
                    counter: c, value, ..
                } if c == counter => Some((r.at, value)),
                _ => None,
            })
            .collect()
    }

    /// First time a counter reached `value`
    pub fn counter_reached(&self, counter: CounterId, value: u32) -> Option<SimTime> {
        self.counter_values(counter)
            .into_iter()
            .find(|(_, v)| *v >= value)
            .map(|(at, _)| at)
    }

    /// Landmark snapshots emitted on behalf of `stage`
    pub fn landmarks(&self, stage: StageId) -> Vec<(SimTime, &LandmarkSet)> {
        self.events
            .iter()
            .filter_map(|r| match &r.event {
                ShieldEvent::LandmarksChanged { stage: s, landmarks } if *s == stage => {
                    Some((r.at, landmarks))
                }
                _ => None,
            })
            .collect()
    }

    /// Time of the first switch of `stage` into `phase`
    pub fn phase_change(&self, stage: StageId, phase: StagePhase) -> Option<SimTime> {
        self.events
            .iter()
            .find(|r| r.event == ShieldEvent::PhaseChanged { stage, phase })
            .map(|r| r.at)
    }

    /// Number of events tagged with `stage`
    pub fn count_tagged(&self, stage: StageId) -> usize {
        self.events
            .iter()
            .filter(|r| r.event.stage() == stage)
            .count()
    }

    /// Destinations of every transition request, in order
    pub fn transitions(&self) -> Vec<(StageId, StageId)> {
        self.events
            .iter()
            .filter_map(|r| match r.event {
                ShieldEvent::TransitionRequested { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }
}
