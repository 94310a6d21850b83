//! Idle-wait synchronization for `/css?waitForIdle`.
//!
//! Extractions bump a change counter when they complete. The coordinator
//! is idle once nothing is in flight and the counter has not moved for the
//! grace window. Waiters park on a condvar that every change notifies, so
//! there is no polling.
//!
//! ```text
//!            begin()                 finish, grace elapsed
//!   Draining ───────► Active ──────► Draining ─────────────► Idle
//!       ▲                                                    │
//!       └──────────────────── begin() ◄──────────────────────┘
//! ```
//!
//! Before the first completed extraction the tracker stays `Draining`, so a
//! wait started on a fresh coordinator ends only at the ceiling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Observable idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePhase {
    /// At least one extraction is in flight.
    Active,
    /// Nothing in flight, but the grace window has not elapsed.
    Draining,
    /// Quiet for at least the grace window.
    Idle,
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Idle(Duration),
    TimedOut(Duration),
}

impl WaitOutcome {
    pub fn waited(self) -> Duration {
        match self {
            Self::Idle(d) | Self::TimedOut(d) => d,
        }
    }

    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle(_))
    }
}

#[derive(Debug, Default)]
struct IdleState {
    counter: u64,
    in_flight: usize,
    last_change: Option<Instant>,
}

impl IdleState {
    fn phase_at(&self, now: Instant, grace: Duration) -> IdlePhase {
        if self.in_flight > 0 {
            return IdlePhase::Active;
        }
        match self.last_change {
            Some(at) if now.saturating_duration_since(at) >= grace => IdlePhase::Idle,
            _ => IdlePhase::Draining,
        }
    }
}

/// Tracks extraction activity.
#[derive(Debug)]
pub struct IdleTracker {
    state: Mutex<IdleState>,
    changed: Condvar,
    grace: Duration,
}

impl IdleTracker {
    pub fn new(grace: Duration) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(IdleState::default()),
            changed: Condvar::new(),
            grace,
        })
    }

    /// Mark an extraction as started. It completes when the guard drops.
    pub fn begin(self: &Arc<Self>) -> Activity {
        self.state.lock().in_flight += 1;
        self.changed.notify_all();
        Activity {
            tracker: Arc::clone(self),
        }
    }

    /// Completed extractions.
    pub fn counter(&self) -> u64 {
        self.state.lock().counter
    }

    pub fn phase(&self) -> IdlePhase {
        self.state.lock().phase_at(Instant::now(), self.grace)
    }

    /// Block until idle or until `max_wait` has elapsed.
    pub fn wait_for_idle(&self, max_wait: Duration) -> WaitOutcome {
        let start = Instant::now();
        let deadline = start + max_wait;
        let mut state = self.state.lock();

        loop {
            let now = Instant::now();
            if state.phase_at(now, self.grace) == IdlePhase::Idle {
                return WaitOutcome::Idle(now - start);
            }
            if now >= deadline {
                return WaitOutcome::TimedOut(now - start);
            }

            // Wake when the grace window would close, or on any change.
            let wake = match (state.in_flight, state.last_change) {
                (0, Some(at)) => (at + self.grace).min(deadline),
                _ => deadline,
            };
            self.changed.wait_until(&mut state, wake);
        }
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.counter += 1;
        state.last_change = Some(Instant::now());
        drop(state);
        self.changed.notify_all();
    }
}

/// In-flight extraction; completion is recorded on drop.
#[derive(Debug)]
pub struct Activity {
    tracker: Arc<IdleTracker>,
}

impl Drop for Activity {
    fn drop(&mut self) {
        self.tracker.finish();
    }
}
