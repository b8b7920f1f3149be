use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use rs485prims_frame::Frame;

#[derive(Default)]
struct State {
    slots: HashMap<u8, Frame>,
    closed: bool,
}

/// Per-peer single-frame mailboxes, shared by the receive thread and callers.
///
/// Each peer address holds at most one unread response. A newer frame from
/// the same peer replaces an unread one.
#[derive(Default)]
pub struct PendingSlots {
    state: Mutex<State>,
    filled: Condvar,
}

impl PendingSlots {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop any unread response from `address`.
    pub fn clear(&self, address: u8) {
        self.lock().slots.remove(&address);
    }

    /// Store `frame` as the latest response from `address` and wake waiters.
    pub fn fill(&self, address: u8, frame: Frame) {
        self.lock().slots.insert(address, frame);
        self.filled.notify_all();
    }

    /// Take the unread response from `address`, if any.
    pub fn take(&self, address: u8) -> Option<Frame> {
        self.lock().slots.remove(&address)
    }

    /// Wait until a response from `address` arrives or `deadline` passes.
    ///
    /// Returns early with `None` once the slots are closed and nothing is
    /// waiting for `address`.
    pub fn wait_until(&self, address: u8, deadline: Instant) -> Option<Frame> {
        let mut state = self.lock();
        loop {
            if let Some(frame) = state.slots.remove(&address) {
                return Some(frame);
            }
            if state.closed {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            state = self
                .filled
                .wait_timeout(state, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }

    /// Wake all waiters; later waits return immediately when their slot is empty.
    pub fn close(&self) {
        self.lock().closed = true;
        self.filled.notify_all();
    }
}
