//! Helpers for driving the engine end to end without a real tty.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use speaking_clock::console::{ClockError, Collaborators, DispatchReport, KeyInput, run_engine};
use speaking_clock::core::session::Session;
use speaking_clock::test_support::{
    RecordingPlayer, ScriptedTerminal, SharedBuf, StubSynthesizer, TerminalStats,
};

pub const POLL: Duration = Duration::from_millis(50);
pub const PATIENCE: Duration = Duration::from_secs(5);
pub const FAKE_AUDIO: &[u8] = b"ID3 fake mp3";

/// A running engine on its own thread, plus every handle a test pokes at.
pub struct Harness {
    pub session: Arc<Session>,
    pub keys: Sender<KeyInput>,
    pub stats: TerminalStats,
    pub output: SharedBuf,
    pub texts: Arc<Mutex<Vec<String>>>,
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub seen_audio: Arc<Mutex<Vec<Vec<u8>>>>,
    pub audio_file: PathBuf,
    engine: Option<JoinHandle<Result<DispatchReport, ClockError>>>,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn start(player_template: &str) -> Self {
        Self::start_with_session(player_template, Session::shared())
    }

    pub fn start_with_session(player_template: &str, session: Arc<Session>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let audio_file = dir.path().join("time_file.mp3");
        let (terminal, tx, stats) = ScriptedTerminal::new();
        let output = SharedBuf::default();

        let synthesizer = StubSynthesizer::writing(FAKE_AUDIO);
        let texts = synthesizer.texts();
        let player = RecordingPlayer::new(player_template);
        let calls = player.calls();
        let seen_audio = player.seen_audio();
        let collaborators = Collaborators {
            synthesizer: Box::new(synthesizer),
            player: Box::new(player),
            audio_file: audio_file.clone(),
        };

        let engine_session = Arc::clone(&session);
        let engine_output = output.clone();
        let engine = thread::spawn(move || {
            run_engine(terminal, engine_session, collaborators, engine_output, POLL)
        });

        let harness = Self {
            session,
            keys: tx,
            stats,
            output,
            texts,
            calls,
            seen_audio,
            audio_file,
            engine: Some(engine),
            _dir: dir,
        };
        harness.wait_for_output("clock app waiting on event");
        harness
    }

    pub fn press(&self, key: char) {
        self.keys.send(KeyInput::Char(key)).unwrap();
    }

    /// Drops the key script's sender, so the next poll fails.
    pub fn hang_up(&mut self) {
        let (dead, _) = mpsc::channel();
        self.keys = dead;
    }

    /// Polls until `needle` has been written `times` times.
    pub fn wait_for_output_count(&self, needle: &str, times: usize) {
        let deadline = Instant::now() + PATIENCE;
        while self.output.contents().matches(needle).count() < times {
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {needle:?} x{times}; output so far: {:?}",
                self.output.contents()
            );
            thread::sleep(Duration::from_millis(5));
        }
    }

    pub fn wait_for_output(&self, needle: &str) {
        self.wait_for_output_count(needle, 1);
    }

    /// Presses `key` and waits until the dispatcher has printed `reply`.
    pub fn press_and_wait(&self, key: char, reply: &str) {
        let before = self.output.contents().matches(reply).count();
        self.press(key);
        self.wait_for_output_count(reply, before + 1);
    }

    /// Waits for the engine thread to return.
    pub fn finish(mut self) -> Result<DispatchReport, ClockError> {
        let engine = self.engine.take().unwrap();
        let deadline = Instant::now() + PATIENCE;
        while !engine.is_finished() {
            assert!(Instant::now() < deadline, "engine did not terminate");
            thread::sleep(Duration::from_millis(5));
        }
        engine.join().unwrap()
    }
}
