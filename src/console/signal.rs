//! # Signal Bridge
//!
//! Turns SIGINT/SIGTERM into the same wake-up the dispatcher already waits
//! on. signal-hook's handler only writes to a self-pipe; the bridge thread
//! reads it and calls [`Session::interrupt`], which sets the quit flag and
//! raises the notifier. Nothing else happens on a signal.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use super::ClockError;
use crate::core::session::Session;

pub struct SignalBridge {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalBridge {
    pub fn install(session: Arc<Session>) -> Result<Self, ClockError> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(ClockError::Signal)?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("signal-bridge".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    if session.interrupt() {
                        info!("Signal {signal} received, quitting");
                    } else {
                        debug!("Signal {signal} received, quit already requested");
                    }
                }
            })
            .map_err(|e| {
                handle.close();
                ClockError::Thread(e)
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Unregisters the handlers and stops the bridge thread. Idempotent.
    pub fn close(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            debug!("Signal bridge closed");
        }
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.close();
    }
}
