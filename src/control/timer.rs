//! Single-slot one-shot watchdog.
//!
//! At most one deadline is armed.  Arming replaces (and thereby cancels)
//! the previous one; each arm gets a fresh generation so an expiry that
//! raced with a re-arm is recognised as stale and discarded.

/// Which dwell period a deadline guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watchdog {
    /// Relay has been ON for the maximum allowed time.
    MaxOn,
    /// Relay has been OFF for the minimum required time.
    MinOff,
}

/// Handle for one arming of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId {
    pub kind: Watchdog,
    generation: u32,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    id: TimerId,
    deadline_ms: u64,
}

#[derive(Debug, Default)]
pub struct OneShotTimer {
    armed: Option<Armed>,
    generation: u32,
}

impl OneShotTimer {
    pub const fn new() -> Self {
        Self {
            armed: None,
            generation: 0,
        }
    }

    /// Arm `kind` to fire `duration_ms` after `now_ms`, discarding any
    /// previously armed deadline.
    pub fn arm(&mut self, kind: Watchdog, now_ms: u64, duration_ms: u64) -> TimerId {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        let id = TimerId {
            kind,
            generation: self.generation,
        };
        self.armed = Some(Armed {
            id,
            deadline_ms: now_ms.saturating_add(duration_ms),
        });
        id
    }

    /// Disarm.  A no-op when nothing is armed.
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn armed(&self) -> Option<TimerId> {
        self.armed.map(|a| a.id)
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.armed.map(|a| a.deadline_ms)
    }

    /// Id of the armed timer if its deadline has passed.
    pub fn due(&self, now_ms: u64) -> Option<TimerId> {
        self.armed
            .filter(|a| now_ms >= a.deadline_ms)
            .map(|a| a.id)
    }

    /// Consume an expiry.  Returns the kind only if `id` is still armed.
    pub fn fire(&mut self, id: TimerId) -> Option<Watchdog> {
        match self.armed {
            Some(a) if a.id == id => {
                self.cancel();
                Some(id.kind)
            }
            _ => None,
        }
    }
}
