//! # Raw Input Reader
//!
//! Owns the terminal's raw mode and runs on its own thread. It polls for a
//! keypress with a bounded timeout, so a quit request is noticed within one
//! poll interval even when nobody is typing.
//!
//! Raw mode is held by [`RawMode`], which restores the saved line discipline
//! when dropped. The guard is created before the thread starts (so a
//! non-interactive terminal fails at startup) and dropped on the reader
//! thread as it exits, normally or by unwinding.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use super::ClockError;
use super::event::{KeyInput, Terminal};
use crate::core::session::{QuitReason, Session};

pub const DEFAULT_POLL_MS: u64 = 200;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_MS);

/// A terminal in raw mode. Dropping it restores the original mode, once.
pub struct RawMode<T: Terminal> {
    terminal: T,
}

impl<T: Terminal> RawMode<T> {
    pub fn enter(mut terminal: T) -> Result<Self, ClockError> {
        terminal.enter_raw_mode().map_err(ClockError::Terminal)?;
        info!("Terminal switched to raw mode");
        Ok(Self { terminal })
    }

    pub fn terminal(&mut self) -> &mut T {
        &mut self.terminal
    }
}

impl<T: Terminal> Drop for RawMode<T> {
    fn drop(&mut self) {
        match self.terminal.leave_raw_mode() {
            Ok(()) => info!("Terminal mode restored"),
            Err(e) => warn!("Failed to restore terminal mode: {e}"),
        }
    }
}

/// Wakes the dispatcher if the reader thread ends on its own, so the
/// dispatcher never waits on a reader that is gone.
struct WakeOnExit(Arc<Session>);

impl Drop for WakeOnExit {
    fn drop(&mut self) {
        if self.0.request_quit(QuitReason::InputFailed) {
            warn!("Raw input reader stopped without a quit request");
        }
        self.0.notify();
    }
}

pub struct RawInputReader {
    session: Arc<Session>,
    handle: Option<JoinHandle<()>>,
}

impl RawInputReader {
    /// Switches `terminal` to raw mode and starts the reader thread.
    pub fn spawn<T: Terminal + 'static>(
        terminal: T,
        session: Arc<Session>,
        poll_interval: Duration,
    ) -> Result<Self, ClockError> {
        let raw = RawMode::enter(terminal)?;
        let thread_session = Arc::clone(&session);
        let handle = thread::Builder::new()
            .name("raw-input".to_string())
            .spawn(move || {
                let _wake = WakeOnExit(Arc::clone(&thread_session));
                read_loop(raw, &thread_session, poll_interval);
            })
            .map_err(ClockError::Thread)?;

        Ok(Self {
            session,
            handle: Some(handle),
        })
    }

    /// Waits for the reader thread, and with it the terminal restore.
    pub fn join(mut self) -> Result<(), ClockError> {
        self.join_thread()
    }

    fn join_thread(&mut self) -> Result<(), ClockError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ClockError::ReaderPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for RawInputReader {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.session.request_quit(QuitReason::Shutdown);
            if let Err(e) = self.join_thread() {
                error!("{e}");
            }
        }
    }
}

fn read_loop<T: Terminal>(mut raw: RawMode<T>, session: &Session, poll_interval: Duration) {
    debug!("Raw input reader polling every {:?}", poll_interval);
    while !session.quit_requested() {
        match raw.terminal().poll_key(poll_interval) {
            Ok(None) => {}
            Ok(Some(KeyInput::Char(key))) => {
                if let Some(dropped) = session.push_key(key) {
                    debug!("Keystroke {dropped:?} replaced by {key:?} before dispatch");
                }
            }
            Ok(Some(KeyInput::Interrupt)) => {
                info!("Ctrl-C read from terminal");
                session.interrupt();
            }
            Err(e) => {
                error!("Terminal read failed: {e}");
                break;
            }
        }
    }
    debug!("Raw input reader leaving poll loop");
    // `raw` drops here and restores the terminal.
}
