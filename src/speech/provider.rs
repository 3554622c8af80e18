use std::fmt;
use std::io;
use std::path::Path;

/// Errors from turning text into an audio file.
#[derive(Debug)]
pub enum SpeechError {
    /// Could not build the client or its runtime. Not retryable.
    Setup(String),
    /// Network-level failure (timeout, DNS, connection refused). Retryable.
    Network(String),
    /// The service answered with an error status.
    Api { status: u16, message: String },
    /// The audio could not be written to disk.
    Io(io::Error),
}

impl fmt::Display for SpeechError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechError::Setup(msg) => write!(f, "setup error: {msg}"),
            SpeechError::Network(msg) => write!(f, "network error: {msg}"),
            SpeechError::Api { status, message } => {
                write!(f, "speech service error (HTTP {status}): {message}")
            }
            SpeechError::Io(e) => write!(f, "audio file error: {e}"),
        }
    }
}

impl std::error::Error for SpeechError {}

/// Errors from playing an audio file.
#[derive(Debug)]
pub enum PlaybackError {
    /// The player command is blank.
    EmptyCommand,
    /// The player could not be started.
    Spawn(io::Error),
    /// The player ran but exited unsuccessfully (`None` = killed by a signal).
    ExitStatus(Option<i32>),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::EmptyCommand => write!(f, "no player command configured"),
            PlaybackError::Spawn(e) => write!(f, "failed to start player: {e}"),
            PlaybackError::ExitStatus(Some(code)) => write!(f, "player exited with status {code}"),
            PlaybackError::ExitStatus(None) => write!(f, "player was terminated by a signal"),
        }
    }
}

impl std::error::Error for PlaybackError {}

/// Text to speech. Blocks until the audio file is written.
pub trait Synthesizer: Send {
    /// Returns the name of the speech service.
    fn name(&self) -> &str;

    fn synthesize(&self, text: &str, output: &Path) -> Result<(), SpeechError>;
}

/// Media playback. Blocks until playback finishes or fails.
pub trait Player: Send {
    fn play(&self, audio: &Path) -> Result<(), PlaybackError>;
}
