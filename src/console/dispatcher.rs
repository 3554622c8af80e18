//! # Event Dispatcher
//!
//! The single consumer of session wake-ups and the only caller of the
//! speech collaborators.
//!
//! ```text
//!   Waiting ──wake──▶ Dispatching ──quit flag clear──▶ Waiting
//!                         │
//!                         └──quit flag set──▶ Draining ──join reader──▶ Terminated
//! ```
//!
//! A wake consumes the notification before the keystroke slot is read, so a
//! key that arrives while an action runs leaves the notifier raised and is
//! picked up by the next cycle. Actions are not cancellable: a quit that
//! arrives during playback is acted on when playback returns.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::output::Output;
use super::reader::RawInputReader;
use super::ClockError;
use crate::core::action::{Action, HELP_TEXT};
use crate::core::clock;
use crate::core::session::{QuitReason, Session};
use crate::speech::{Player, Synthesizer};

pub const WAITING_BANNER: &str = "clock app waiting on event";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Waiting,
    Dispatching,
    Draining,
    Terminated,
}

/// The external collaborators the actions call into.
pub struct Collaborators {
    pub synthesizer: Box<dyn Synthesizer>,
    pub player: Box<dyn Player>,
    /// Fixed cache path the synthesized speech is written to.
    pub audio_file: PathBuf,
}

/// What happened over one run of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub actions: Vec<Action>,
    pub quit_reason: Option<QuitReason>,
    pub dropped_keys: u64,
    /// From entering `Draining` to the reader thread having exited.
    pub join_latency: Duration,
}

pub struct EventDispatcher<W: Write> {
    session: Arc<Session>,
    collaborators: Collaborators,
    out: Output<W>,
    state: DispatchState,
    actions: Vec<Action>,
}

impl<W: Write> EventDispatcher<W> {
    pub fn new(session: Arc<Session>, collaborators: Collaborators, output: W) -> Self {
        Self {
            session,
            collaborators,
            out: Output::new(output),
            state: DispatchState::Waiting,
            actions: Vec::new(),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Runs until quit, then joins the reader. Consumes the reader, so it is
    /// joined exactly once.
    pub fn run(mut self, reader: RawInputReader) -> Result<DispatchReport, ClockError> {
        self.out.say(WAITING_BANNER);
        while self.cycle() == DispatchState::Waiting {}
        self.drain(reader)
    }

    /// One dispatch cycle: wait for a wake-up, handle the pending keystroke,
    /// and report the state the dispatcher ends up in.
    pub fn cycle(&mut self) -> DispatchState {
        if !self.session.quit_requested() {
            self.state = DispatchState::Waiting;
            self.session.wait();
        }

        self.state = DispatchState::Dispatching;
        match self.session.take_key() {
            Some(key) if self.session.quit_requested() => {
                debug!("Keystroke {key:?} ignored, quit already requested");
            }
            Some(key) => self.perform(Action::for_key(key)),
            None => debug!("Wake-up without a keystroke"),
        }

        self.state = if self.session.quit_requested() {
            DispatchState::Draining
        } else {
            DispatchState::Waiting
        };
        self.state
    }

    fn perform(&mut self, action: Action) {
        info!("Dispatching {}", action.label());
        self.actions.push(action);
        match action {
            Action::Help => self.out.say(HELP_TEXT),
            Action::SpeakTime => self.speak_time(),
            Action::Quit => {
                self.out.say("Quit!");
                self.session.request_quit(QuitReason::Key);
            }
            Action::Unknown(key) => {
                debug!("No binding for {key:?}");
                self.out.say("Unknown key");
            }
        }
    }

    /// Synthesize then play. Failures are reported and swallowed.
    fn speak_time(&mut self) {
        let phrase = clock::now_phrase();
        let audio_file = &self.collaborators.audio_file;
        let synthesizer = &self.collaborators.synthesizer;

        if let Err(e) = synthesizer.synthesize(&phrase, audio_file) {
            warn!("Speech synthesis via {} failed: {e}", synthesizer.name());
            self.out.say(&format!("Error, speech synthesis failed: {e}"));
            return;
        }
        if let Err(e) = self.collaborators.player.play(audio_file) {
            warn!("Playback of {} failed: {e}", audio_file.display());
            self.out.say(&format!("Error, playback failed: {e}"));
        }
    }

    fn drain(mut self, reader: RawInputReader) -> Result<DispatchReport, ClockError> {
        self.state = DispatchState::Draining;
        let quit_reason = self.session.quit_reason();
        match quit_reason {
            Some(QuitReason::Interrupt) => self.out.say("CTRL-C QUIT"),
            Some(QuitReason::InputFailed) => self.out.say("Error, terminal input failed"),
            _ => {}
        }
        info!("Draining after quit ({:?})", quit_reason);

        let started = Instant::now();
        let joined = reader.join();
        let join_latency = started.elapsed();
        self.state = DispatchState::Terminated;
        joined?;
        debug!("Reader joined after {:?}", join_latency);

        Ok(DispatchReport {
            actions: self.actions,
            quit_reason,
            dropped_keys: self.session.dropped_keys(),
            join_latency,
        })
    }
}
