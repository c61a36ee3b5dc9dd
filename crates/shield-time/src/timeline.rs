//! Timeline - one simulated clock driving every timer
//!
//! Timers fire in `(due, sequence)` order. Events are handed out one at a
//! time so the consumer can cancel other timers before the next event is
//! produced: a cancelled timer never fires again, even if its next tick was
//! already queued.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use shield_core::{ShieldError, ShieldResult, SimTime, TimerId};

use crate::{TickOutcome, Ticker};

/// What a scheduled timer does when it comes due
#[derive(Clone, Debug)]
pub enum TimerKind {
    /// Fires once after a delay
    Once,
    /// Fires every interval until cancelled
    Repeat(Duration),
    /// Advances a ticker every interval until it completes
    Ticker(Ticker),
}

/// Payload of a fired timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerFire {
    /// A one-shot or repeating timer elapsed
    Elapsed,
    /// A ticker advanced; `completed` is set exactly once, on its last tick
    Tick { value: u32, completed: bool },
}

/// A timer that came due
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerEvent<K> {
    pub id: TimerId,
    pub key: K,
    pub at: SimTime,
    pub fire: TimerFire,
}

#[derive(Clone, Debug)]
struct TimerEntry<K> {
    key: K,
    kind: TimerKind,
}

/// Virtual-clock timer queue
///
/// `K` is an owner tag handed back with every event.
#[derive(Debug)]
pub struct Timeline<K> {
    now: SimTime,
    next_id: u64,
    next_seq: u64,
    entries: HashMap<TimerId, TimerEntry<K>>,
    queue: BinaryHeap<Reverse<(SimTime, u64, TimerId)>>,
}

impl<K: Clone> Timeline<K> {
    /// Create a timeline at time zero
    pub fn new() -> Self {
        Self::starting_at(SimTime::ZERO)
    }

    pub fn starting_at(now: SimTime) -> Self {
        Timeline {
            now,
            next_id: 1,
            next_seq: 0,
            entries: HashMap::new(),
            queue: BinaryHeap::new(),
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Fire once, `delay` from now
    pub fn schedule_once(&mut self, key: K, delay: Duration) -> TimerId {
        self.insert(key, TimerKind::Once, delay)
    }

    /// Fire every `interval`, first one `interval` from now
    pub fn schedule_repeating(&mut self, key: K, interval: Duration) -> ShieldResult<TimerId> {
        if interval.as_millis() == 0 {
            return Err(ShieldError::InvalidConfig(
                "repeating timer interval must be at least 1ms".into(),
            ));
        }
        Ok(self.insert(key, TimerKind::Repeat(interval), interval))
    }

    /// Drive `ticker` at its own interval
    pub fn schedule_ticker(&mut self, key: K, ticker: Ticker) -> TimerId {
        let interval = ticker.interval();
        self.insert(key, TimerKind::Ticker(ticker), interval)
    }

    fn insert(&mut self, key: K, kind: TimerKind, delay: Duration) -> TimerId {
        let id = TimerId::new(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, TimerEntry { key, kind });
        self.enqueue(id, self.now + delay);
        id
    }

    fn enqueue(&mut self, id: TimerId, due: SimTime) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((due, seq, id)));
    }

    /// Cancel a timer. Returns whether it was still live.
    ///
    /// Cancelling an unknown, completed or already-cancelled timer is a
    /// no-op.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            tracing::trace!(timer = ?id, "timer cancelled");
        }
        removed
    }

    /// Cancel every live timer, returning how many were live
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.queue.clear();
        count
    }

    pub fn is_live(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of live timers
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }

    /// Ticker state behind a live ticker timer
    pub fn ticker(&self, id: TimerId) -> Option<&Ticker> {
        match &self.entries.get(&id)?.kind {
            TimerKind::Ticker(ticker) => Some(ticker),
            _ => None,
        }
    }

    /// Due time of the next live timer
    pub fn next_due(&mut self) -> Option<SimTime> {
        self.discard_stale();
        self.queue.peek().map(|Reverse((due, _, _))| *due)
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse((_, _, id))) = self.queue.peek() {
            if self.entries.contains_key(id) {
                break;
            }
            self.queue.pop();
        }
    }

    /// Pop the next timer due at or before `until`
    ///
    /// The clock moves to the event's due time. Repeating timers and running
    /// tickers are re-armed before the event is returned.
    pub fn pop_due(&mut self, until: SimTime) -> Option<TimerEvent<K>> {
        loop {
            self.discard_stale();
            let Reverse((due, _, id)) = *self.queue.peek()?;
            if due > until {
                return None;
            }
            self.queue.pop();
            self.now = self.now.max(due);

            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            let key = entry.key.clone();

            let fired = match &mut entry.kind {
                TimerKind::Once => Some((TimerFire::Elapsed, None)),
                TimerKind::Repeat(interval) => Some((TimerFire::Elapsed, Some(*interval))),
                TimerKind::Ticker(ticker) => {
                    let interval = ticker.interval();
                    ticker.advance().map(|outcome| match outcome {
                        TickOutcome::Advanced(value) => (
                            TimerFire::Tick {
                                value,
                                completed: false,
                            },
                            Some(interval),
                        ),
                        TickOutcome::Completed(value) => (
                            TimerFire::Tick {
                                value,
                                completed: true,
                            },
                            None,
                        ),
                    })
                }
            };

            let Some((fire, rearm)) = fired else {
                // Ticker stopped behind our back
                self.entries.remove(&id);
                continue;
            };

            match rearm {
                Some(interval) => self.enqueue(id, due + interval),
                None => {
                    self.entries.remove(&id);
                }
            }

            return Some(TimerEvent {
                id,
                key,
                at: due,
                fire,
            });
        }
    }

    /// Move the clock forward to `until` without firing anything
    ///
    /// Callers drain `pop_due(until)` first.
    pub fn settle(&mut self, until: SimTime) {
        self.now = self.now.max(until);
    }

    /// Fire everything due up to `until`, handing each event to `handler`
    ///
    /// The handler gets the timeline back so it can cancel or schedule
    /// timers between events.
    pub fn run_until<F>(&mut self, until: SimTime, mut handler: F)
    where
        F: FnMut(&mut Self, TimerEvent<K>),
    {
        while let Some(event) = self.pop_due(until) {
            handler(self, event);
        }
        self.settle(until);
    }
}

impl<K: Clone> Default for Timeline<K> {
    fn default() -> Self {
        Self::new()
    }
}
