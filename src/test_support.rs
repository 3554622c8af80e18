//! Test utilities shared by the unit tests and the `tests/` integration tests.
//!
//! Compiled for unit tests and, through the `test-support` feature, for the
//! integration tests.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::console::event::{KeyInput, Terminal};
use crate::speech::{CommandPlayer, PlaybackError, Player, SpeechError, Synthesizer};

/// An in-memory writer whose contents stay readable after it is moved.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Records the text it was asked to speak. Writes nothing unless built with
/// [`StubSynthesizer::writing`].
#[derive(Default)]
pub struct StubSynthesizer {
    texts: Arc<Mutex<Vec<String>>>,
    audio: Option<&'static [u8]>,
}

impl StubSynthesizer {
    /// A stub that writes `audio` where the speech should go.
    pub fn writing(audio: &'static [u8]) -> Self {
        Self {
            texts: Arc::default(),
            audio: Some(audio),
        }
    }

    pub fn texts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.texts)
    }
}

impl Synthesizer for StubSynthesizer {
    fn name(&self) -> &str {
        "stub"
    }

    fn synthesize(&self, text: &str, output: &Path) -> Result<(), SpeechError> {
        self.texts.lock().unwrap().push(text.to_string());
        match self.audio {
            Some(audio) => fs::write(output, audio).map_err(SpeechError::Io),
            None => Ok(()),
        }
    }
}

pub struct FailingSynthesizer;

impl Synthesizer for FailingSynthesizer {
    fn name(&self) -> &str {
        "failing"
    }

    fn synthesize(&self, _text: &str, _output: &Path) -> Result<(), SpeechError> {
        Err(SpeechError::Network("connection refused".to_string()))
    }
}

/// Records the command line a `CommandPlayer` with the same template would
/// run, and what the audio file held at that moment.
pub struct RecordingPlayer {
    template: CommandPlayer,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    seen_audio: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingPlayer {
    pub fn new(template: &str) -> Self {
        Self {
            template: CommandPlayer::new(template),
            calls: Arc::default(),
            seen_audio: Arc::default(),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.calls)
    }

    pub fn seen_audio(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.seen_audio)
    }
}

impl Player for RecordingPlayer {
    fn play(&self, audio: &Path) -> Result<(), PlaybackError> {
        let argv = self
            .template
            .command_line(audio)
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().unwrap().push(argv);
        self.seen_audio
            .lock()
            .unwrap()
            .push(fs::read(audio).unwrap_or_default());
        Ok(())
    }
}

pub struct FailingPlayer;

impl Player for FailingPlayer {
    fn play(&self, _audio: &Path) -> Result<(), PlaybackError> {
        Err(PlaybackError::ExitStatus(Some(1)))
    }
}

/// Counts raw mode transitions on a [`ScriptedTerminal`].
#[derive(Clone, Default)]
pub struct TerminalStats {
    entered: Arc<AtomicUsize>,
    restored: Arc<AtomicUsize>,
}

impl TerminalStats {
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn restored(&self) -> usize {
        self.restored.load(Ordering::SeqCst)
    }
}

/// A terminal fed from a channel. Dropping the sender makes the next poll
/// fail like a hung-up tty.
pub struct ScriptedTerminal {
    keys: Receiver<KeyInput>,
    stats: TerminalStats,
    refuse_raw_mode: bool,
}

impl ScriptedTerminal {
    pub fn new() -> (Self, Sender<KeyInput>, TerminalStats) {
        let (tx, rx) = mpsc::channel();
        let stats = TerminalStats::default();
        let terminal = Self {
            keys: rx,
            stats: stats.clone(),
            refuse_raw_mode: false,
        };
        (terminal, tx, stats)
    }

    pub fn failing_raw_mode() -> (Self, Sender<KeyInput>, TerminalStats) {
        let (mut terminal, tx, stats) = Self::new();
        terminal.refuse_raw_mode = true;
        (terminal, tx, stats)
    }
}

impl Terminal for ScriptedTerminal {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        if self.refuse_raw_mode {
            return Err(io::Error::other("not a terminal"));
        }
        self.stats.entered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        self.stats.restored.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>> {
        match self.keys.recv_timeout(timeout) {
            Ok(key) => Ok(Some(key)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal hung up"))
            }
        }
    }
}
