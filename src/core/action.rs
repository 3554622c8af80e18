//! # Actions
//!
//! Every keystroke the dispatcher takes becomes an `Action`.
//! `Action::for_key` is the whole key table: pure, case-sensitive and total,
//! so an unbound key is `Action::Unknown`, never an error.
//!
//! ```text
//! '?' | 'h'  →  Help
//! 't'        →  SpeakTime
//! 'q'        →  Quit
//!  other     →  Unknown(other)
//! ```
//!
//! Running an action is the dispatcher's job; this module has no I/O.

/// Static usage text printed by `Action::Help`.
pub const HELP_TEXT: &str = "\
=== Help
? - help
h - help
q - quit
t - speak time
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Help,
    SpeakTime,
    Quit,
    Unknown(char),
}

impl Action {
    pub fn for_key(key: char) -> Self {
        match key {
            '?' | 'h' => Action::Help,
            't' => Action::SpeakTime,
            'q' => Action::Quit,
            other => Action::Unknown(other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Help => "help",
            Action::SpeakTime => "speak time",
            Action::Quit => "quit",
            Action::Unknown(_) => "unknown",
        }
    }
}
