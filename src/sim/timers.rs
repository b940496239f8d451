//! Virtual-time timer queue
//!
//! Single-threaded event loop over integer milliseconds. Timers fire in due
//! order, ties broken by arming order. Cancelling a timer drops it from the
//! table; any queue entry still referring to it is discarded when popped, so
//! a cancelled timer can never fire late.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// One-second game clock
    ClockTick,
    SpawnObstacle,
    SpawnCollectible,
    /// Movement + collision pass over live entities
    Sweep,
    JumpLanded,
    PowerUpExpired,
    InvulnerabilityExpired,
    PlayerBuffExpired,
    /// Overtime speed-up
    DifficultyRamp,
}

/// Handle returned when arming a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
struct Timer {
    kind: TimerKind,
    /// Repeat period, `None` for one-shots
    period_ms: Option<u64>,
    /// Sequence number of the queue entry currently armed for this timer
    armed_seq: u64,
}

/// Queue entry: (due, seq, id). `seq` orders ties and detects stale entries.
type Slot = Reverse<(u64, u64, TimerId)>;

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_seq: u64,
    next_id: u64,
    queue: BinaryHeap<Slot>,
    timers: HashMap<TimerId, Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Fire once, `delay_ms` from now
    pub fn once(&mut self, kind: TimerKind, delay_ms: u64) -> TimerId {
        self.arm_new(kind, delay_ms, None)
    }

    /// Fire every `period_ms`, first firing one period from now
    pub fn repeating(&mut self, kind: TimerKind, period_ms: u64) -> TimerId {
        let period_ms = period_ms.max(1);
        self.arm_new(kind, period_ms, Some(period_ms))
    }

    /// Returns false if the timer had already fired (one-shot) or been cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Cancel if present and clear the handle
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerId>) {
        if let Some(id) = slot.take() {
            self.cancel(id);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// Drop every timer. Time keeps its current value.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.timers.clear();
    }

    /// Pop the next timer due at or before `until_ms`, moving `now` to its due
    /// time. Repeating timers are re-armed one period later.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired> {
        loop {
            let Reverse((due, seq, id)) = *self.queue.peek()?;
            if due > until_ms {
                return None;
            }
            self.queue.pop();

            let Some(timer) = self.timers.get(&id) else {
                continue; // cancelled
            };
            if timer.armed_seq != seq {
                continue; // superseded entry
            }

            let kind = timer.kind;
            let period = timer.period_ms;
            self.now_ms = self.now_ms.max(due);

            match period {
                Some(period) => {
                    let seq = self.bump_seq();
                    if let Some(timer) = self.timers.get_mut(&id) {
                        timer.armed_seq = seq;
                    }
                    self.queue.push(Reverse((due + period, seq, id)));
                }
                None => {
                    self.timers.remove(&id);
                }
            }

            return Some(Fired {
                id,
                kind,
                at_ms: due,
            });
        }
    }

    /// Move the clock forward once all due timers have been drained
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    fn arm_new(&mut self, kind: TimerKind, delay_ms: u64, period_ms: Option<u64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.timers.insert(
            id,
            Timer {
                kind,
                period_ms,
                armed_seq: seq,
            },
        );
        self.queue.push(Reverse((self.now_ms + delay_ms, seq, id)));
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
