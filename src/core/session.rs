//! # Session
//!
//! Process-wide state for one run of the clock, shared by the raw input
//! reader thread, the signal bridge and the dispatcher.
//!
//! ```text
//! Session
//! ├── quit: AtomicU8          // None → Some(reason), never back
//! ├── pending_key: AtomicU32  // at most one unconsumed keystroke
//! ├── dropped_keys: AtomicU64 // keystrokes overwritten before dispatch
//! └── notifier: Notifier      // many producers, one consumer
//! ```
//!
//! The pending keystroke slot is last-write-wins: a key pressed before the
//! dispatcher took the previous one replaces it. The overwrite is counted and
//! logged, it is not an error.

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Marks an empty keystroke slot. Never a valid `char`.
const NO_KEY: u32 = u32::MAX;
const NOT_QUITTING: u8 = 0;

/// Why the session is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QuitReason {
    /// The quit key was dispatched.
    Key = 1,
    /// SIGINT/SIGTERM, or Ctrl-C read while the terminal is raw.
    Interrupt = 2,
    /// The reader thread stopped without being asked to.
    InputFailed = 3,
    /// The engine is being torn down before the dispatcher finished.
    Shutdown = 4,
}

impl QuitReason {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(QuitReason::Key),
            2 => Some(QuitReason::Interrupt),
            3 => Some(QuitReason::InputFailed),
            4 => Some(QuitReason::Shutdown),
            _ => None,
        }
    }
}

/// An auto-reset event: `notify` raises it, a successful wait lowers it again.
///
/// Because the waiter consumes the signal at wake-up, a `notify` that lands
/// while the consumer is busy stays raised until the next wait.
#[derive(Debug, Default)]
pub struct Notifier {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        let mut signaled = self.signaled.lock().unwrap_or_else(PoisonError::into_inner);
        *signaled = true;
        self.cond.notify_one();
    }

    /// Blocks until raised, then lowers the signal.
    pub fn wait(&self) {
        let mut signaled = self.signaled.lock().unwrap_or_else(PoisonError::into_inner);
        while !*signaled {
            signaled = self
                .cond
                .wait(signaled)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *signaled = false;
    }

    /// Like [`Notifier::wait`] but gives up after `timeout`.
    /// Returns true if a signal was consumed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let signaled = self.signaled.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut signaled, _) = self
            .cond
            .wait_timeout_while(signaled, timeout, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
        let woke = *signaled;
        *signaled = false;
        woke
    }

    pub fn is_raised(&self) -> bool {
        *self.signaled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct Session {
    quit: AtomicU8,
    pending_key: AtomicU32,
    dropped_keys: AtomicU64,
    notifier: Notifier,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            quit: AtomicU8::new(NOT_QUITTING),
            pending_key: AtomicU32::new(NO_KEY),
            dropped_keys: AtomicU64::new(0),
            notifier: Notifier::new(),
        }
    }

    /// A fresh session behind the shared handle every execution context holds.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Acquire) != NOT_QUITTING
    }

    pub fn quit_reason(&self) -> Option<QuitReason> {
        QuitReason::from_u8(self.quit.load(Ordering::Acquire))
    }

    /// Sets the quit flag. Only the first request is recorded; returns
    /// whether this call was the one that flipped it.
    pub fn request_quit(&self, reason: QuitReason) -> bool {
        self.quit
            .compare_exchange(
                NOT_QUITTING,
                reason as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Quit and wake the dispatcher. Does no I/O and takes no locks other
    /// than the notifier's own.
    pub fn interrupt(&self) -> bool {
        let first = self.request_quit(QuitReason::Interrupt);
        self.notifier.notify();
        first
    }

    /// Stores a keystroke and wakes the dispatcher. Returns the keystroke it
    /// replaced, if the previous one was never taken.
    pub fn push_key(&self, key: char) -> Option<char> {
        let previous = self.pending_key.swap(key as u32, Ordering::AcqRel);
        self.notifier.notify();
        let previous = char::from_u32(previous);
        if previous.is_some() {
            self.dropped_keys.fetch_add(1, Ordering::Relaxed);
        }
        previous
    }

    /// Takes and clears the pending keystroke.
    pub fn take_key(&self) -> Option<char> {
        char::from_u32(self.pending_key.swap(NO_KEY, Ordering::AcqRel))
    }

    pub fn dropped_keys(&self) -> u64 {
        self.dropped_keys.load(Ordering::Relaxed)
    }

    pub fn notify(&self) {
        self.notifier.notify();
    }

    pub fn wait(&self) {
        self.notifier.wait();
    }

    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.notifier.wait_timeout(timeout)
    }

    pub fn has_pending_wakeup(&self) -> bool {
        self.notifier.is_raised()
    }
}
