//! Arrival-order serialization.
//!
//! Each `/extract` handler takes a [`Ticket`] once its request body is
//! complete, so every outstanding ticket belongs to a running thread.
//! Tickets are redeemed with [`Ticket::wait`], which blocks until every
//! earlier ticket has finished its [`Turn`]. A ticket dropped without
//! being redeemed still takes (and immediately releases) its turn, so one
//! failed request never stalls the ones behind it.
//!
//! ```text
//! issue:    #0         #1         #2
//! turns:        #1 waits ─┐   #0 runs ─► done ─► #1 runs ─► #2 runs
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

/// Issues tickets and tracks whose turn it is.
#[derive(Debug, Default)]
pub struct Sequencer {
    next_ticket: AtomicU64,
    now_serving: Mutex<u64>,
    turn_changed: Condvar,
}

impl Sequencer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the next ticket. The caller must redeem or drop it.
    pub fn issue(self: &Arc<Self>) -> Ticket {
        let number = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        Ticket {
            number,
            sequencer: Some(Arc::clone(self)),
        }
    }

    /// Number of turns completed so far.
    pub fn completed(&self) -> u64 {
        *self.now_serving.lock()
    }

    fn wait_for(&self, number: u64) {
        let mut serving = self.now_serving.lock();
        while *serving != number {
            self.turn_changed.wait(&mut serving);
        }
    }

    fn advance(&self) {
        let mut serving = self.now_serving.lock();
        *serving += 1;
        self.turn_changed.notify_all();
    }
}

/// A place in line.
#[derive(Debug)]
pub struct Ticket {
    number: u64,
    sequencer: Option<Arc<Sequencer>>,
}

impl Ticket {
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Block until every earlier ticket is done, then hold the turn.
    pub fn wait(mut self) -> Turn {
        let sequencer = self
            .sequencer
            .take()
            .unwrap_or_else(|| unreachable!("ticket redeemed twice"));
        sequencer.wait_for(self.number);
        Turn { sequencer }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if let Some(sequencer) = self.sequencer.take() {
            sequencer.wait_for(self.number);
            sequencer.advance();
        }
    }
}

/// Exclusive turn; the next ticket proceeds when this is dropped.
#[derive(Debug)]
pub struct Turn {
    sequencer: Arc<Sequencer>,
}

impl Drop for Turn {
    fn drop(&mut self) {
        self.sequencer.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_turns_follow_issue_order() {
        let sequencer = Sequencer::new();
        let tickets: Vec<_> = (0..8).map(|_| sequencer.issue()).collect();
        let log = Arc::new(Mutex::new(Vec::new()));

        // Redeem in reverse order from separate threads.
        let handles: Vec<_> = tickets
            .into_iter()
            .rev()
            .map(|ticket| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    let number = ticket.number();
                    let _turn = ticket.wait();
                    log.lock().push(number);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*log.lock(), (0..8).collect::<Vec<_>>());
        assert_eq!(sequencer.completed(), 8);
    }

    #[test]
    fn test_dropped_ticket_releases_turn() {
        let sequencer = Sequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();

        let waiter = thread::spawn(move || {
            let _turn = second.wait();
        });
        thread::sleep(Duration::from_millis(20));
        drop(first);

        waiter.join().unwrap();
        assert_eq!(sequencer.completed(), 2);
    }

    #[test]
    fn test_turn_blocks_next_until_dropped() {
        let sequencer = Sequencer::new();
        let first = sequencer.issue().wait();
        let second = sequencer.issue();

        let waiter = thread::spawn(move || {
            let _turn = second.wait();
        });
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        drop(first);
        waiter.join().unwrap();
    }
}
