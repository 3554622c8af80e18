//! # Console Adapter
//!
//! Terminal I/O and the event-dispatch engine. Handles raw mode, signals and
//! the dispatch loop, and translates keystrokes into `core::action::Action`
//! values.
//!
//! This is the only module that knows about crossterm and signal-hook.
//!
//! ## Threads
//!
//! - **main**: the [`EventDispatcher`]. Sole consumer of wake-ups, sole
//!   caller of the speech collaborators.
//! - **raw-input**: the [`RawInputReader`]. Sole writer of the keystroke slot.
//! - **signal-bridge**: the [`SignalBridge`]. Forwards SIGINT/SIGTERM.
//!
//! ## Shutdown
//!
//! quit flag set → reader notices within one poll interval and restores the
//! terminal → dispatcher joins the reader → `run` returns.

pub mod dispatcher;
pub mod event;
mod output;
pub mod reader;
pub mod signal;

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::core::config::ResolvedConfig;
use crate::core::session::Session;
use crate::speech::{CommandPlayer, GoogleTts, SpeechError};

pub use dispatcher::{Collaborators, DispatchReport, DispatchState, EventDispatcher};
pub use event::{CrosstermTerminal, KeyInput, Terminal};
pub use reader::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MS, RawInputReader, RawMode};
pub use signal::SignalBridge;

// ============================================================================
// Error Type
// ============================================================================

/// Failures that stop the engine. Action failures never get here.
#[derive(Debug)]
pub enum ClockError {
    /// stdin is not an interactive terminal.
    NotATerminal,
    /// Raw mode could not be entered.
    Terminal(io::Error),
    /// Signal handlers could not be registered.
    Signal(io::Error),
    /// A worker thread could not be started.
    Thread(io::Error),
    /// The speech collaborator could not be built.
    Speech(SpeechError),
    /// The reader thread panicked. The terminal was still restored.
    ReaderPanicked,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::NotATerminal => write!(f, "standard input is not an interactive terminal"),
            ClockError::Terminal(e) => write!(f, "failed to switch terminal to raw mode: {e}"),
            ClockError::Signal(e) => write!(f, "failed to install signal handlers: {e}"),
            ClockError::Thread(e) => write!(f, "failed to start thread: {e}"),
            ClockError::Speech(e) => write!(f, "speech service unavailable: {e}"),
            ClockError::ReaderPanicked => write!(f, "raw input reader panicked"),
        }
    }
}

impl std::error::Error for ClockError {}

// ============================================================================
// Engine
// ============================================================================

/// Starts the reader on `terminal` and runs the dispatcher on the calling
/// thread until quit.
pub fn run_engine<T, W>(
    terminal: T,
    session: Arc<Session>,
    collaborators: Collaborators,
    output: W,
    poll_interval: Duration,
) -> Result<DispatchReport, ClockError>
where
    T: Terminal + 'static,
    W: Write,
{
    let reader = RawInputReader::spawn(terminal, Arc::clone(&session), poll_interval)?;
    EventDispatcher::new(session, collaborators, output).run(reader)
}

/// Runs the clock on the process's own terminal.
pub fn run(config: &ResolvedConfig, poll_interval: Duration) -> Result<DispatchReport, ClockError> {
    let terminal = CrosstermTerminal::attach()?;
    let collaborators = Collaborators {
        synthesizer: Box::new(
            GoogleTts::new(config.tts_url.clone(), config.tts_lang.clone())
                .map_err(ClockError::Speech)?,
        ),
        player: Box::new(CommandPlayer::new(&config.player)),
        audio_file: config.audio_file.clone(),
    };

    let session = Session::shared();
    let _signals = SignalBridge::install(Arc::clone(&session))?;
    info!("Clock starting, player: {:?}", config.player);

    run_engine(terminal, session, collaborators, io::stdout(), poll_interval)
}
