use std::io::{self, IsTerminal};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// A single decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    /// Ctrl-C. Raw mode stops the terminal from turning it into SIGINT.
    Interrupt,
}

/// The controlling terminal, as far as the raw input reader needs it.
pub trait Terminal: Send {
    /// Saves the current line discipline and switches to raw mode.
    fn enter_raw_mode(&mut self) -> io::Result<()>;

    /// Puts back the line discipline saved by `enter_raw_mode`.
    fn leave_raw_mode(&mut self) -> io::Result<()>;

    /// Waits up to `timeout` for a keypress.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>>;
}

/// The process's real terminal, driven through crossterm.
#[derive(Debug)]
pub struct CrosstermTerminal {
    _private: (),
}

impl CrosstermTerminal {
    /// Fails unless stdin is an interactive terminal.
    pub fn attach() -> Result<Self, super::ClockError> {
        if !io::stdin().is_terminal() {
            return Err(super::ClockError::NotATerminal);
        }
        Ok(Self { _private: () })
    }
}

impl Terminal for CrosstermTerminal {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()
    }

    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key_event) => {
                log::debug!(
                    "Key event: {:?} with modifiers {:?}",
                    key_event.code,
                    key_event.modifiers
                );
                Ok(translate_key(key_event))
            }
            _ => Ok(None),
        }
    }
}

/// Escape, the first byte a terminal sends for Alt chords and special keys.
const ESC: char = '\u{1b}';
const DEL: char = '\u{7f}';

/// Maps a crossterm key event onto the bytes a cbreak terminal would have
/// delivered, so every keypress reaches the action table as one character.
///
/// Only unmodified or shifted characters arrive as themselves. Ctrl+letter
/// becomes its control code, Alt chords and navigation keys become the
/// escape that leads their sequence. Lone modifier and lock keys send
/// nothing and yield `None`.
pub fn translate_key(key_event: KeyEvent) -> Option<KeyInput> {
    // Some platforms also report releases and repeats.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }
    let modifiers = key_event.modifiers;
    let ch = match key_event.code {
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => {
            return Some(KeyInput::Interrupt);
        }
        KeyCode::Char(_) if modifiers.contains(KeyModifiers::ALT) => ESC,
        KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => control_code(c),
        KeyCode::Char(c) if modifiers.difference(KeyModifiers::SHIFT).is_empty() => c,
        KeyCode::Char(_) => ESC,
        KeyCode::Enter => '\n',
        KeyCode::Tab => '\t',
        KeyCode::Backspace => DEL,
        KeyCode::Esc
        | KeyCode::BackTab
        | KeyCode::Up
        | KeyCode::Down
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Home
        | KeyCode::End
        | KeyCode::PageUp
        | KeyCode::PageDown
        | KeyCode::Insert
        | KeyCode::Delete
        | KeyCode::F(_) => ESC,
        _ => return None,
    };
    Some(KeyInput::Char(ch))
}

/// The ASCII control code for Ctrl+`c`. Chords without one fall back to
/// escape.
fn control_code(c: char) -> char {
    match c.to_ascii_uppercase() {
        upper @ '@'..='_' => char::from(upper as u8 & 0x1f),
        '?' => DEL,
        ' ' => '\0',
        _ => ESC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::Action;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_plain_chars_pass_through() {
        assert_eq!(
            translate_key(key(KeyCode::Char('t'), KeyModifiers::NONE)),
            Some(KeyInput::Char('t'))
        );
        assert_eq!(
            translate_key(key(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some(KeyInput::Char('?'))
        );
    }

    #[test]
    fn test_ctrl_c_is_interrupt() {
        assert_eq!(
            translate_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyInput::Interrupt)
        );
    }

    #[test]
    fn test_release_events_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(translate_key(release), None);
    }

    #[test]
    fn test_modified_letters_do_not_reach_bound_actions() {
        let ctrl_q = translate_key(key(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert_eq!(ctrl_q, Some(KeyInput::Char('\u{11}')));

        for (code, modifiers) in [
            (KeyCode::Char('q'), KeyModifiers::CONTROL),
            (KeyCode::Char('q'), KeyModifiers::ALT),
            (KeyCode::Char('t'), KeyModifiers::CONTROL),
            (KeyCode::Char('h'), KeyModifiers::CONTROL | KeyModifiers::SHIFT),
            (KeyCode::Char('?'), KeyModifiers::ALT | KeyModifiers::SHIFT),
            (KeyCode::Char('t'), KeyModifiers::SUPER),
        ] {
            match translate_key(key(code, modifiers)) {
                Some(KeyInput::Char(c)) => assert!(
                    matches!(Action::for_key(c), Action::Unknown(_)),
                    "{modifiers:?}+{code:?} mapped to {:?}",
                    Action::for_key(c)
                ),
                other => panic!("{modifiers:?}+{code:?} translated to {other:?}"),
            }
        }
    }

    #[test]
    fn test_ctrl_letters_become_control_codes() {
        assert_eq!(
            translate_key(key(KeyCode::Char('t'), KeyModifiers::CONTROL)),
            Some(KeyInput::Char('\u{14}'))
        );
        assert_eq!(
            translate_key(key(KeyCode::Char('Q'), KeyModifiers::CONTROL | KeyModifiers::SHIFT)),
            Some(KeyInput::Char('\u{11}'))
        );
        // Ctrl-C with another modifier is not the interrupt chord.
        assert_eq!(
            translate_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL | KeyModifiers::ALT)),
            Some(KeyInput::Char(ESC))
        );
    }

    #[test]
    fn test_editing_and_navigation_keys_report_unknown() {
        assert_eq!(
            translate_key(key(KeyCode::Backspace, KeyModifiers::NONE)),
            Some(KeyInput::Char(DEL))
        );
        for code in [KeyCode::Up, KeyCode::Delete, KeyCode::F(1), KeyCode::Esc] {
            assert_eq!(
                translate_key(key(code, KeyModifiers::NONE)),
                Some(KeyInput::Char(ESC)),
                "{code:?}"
            );
        }
        assert_eq!(Action::for_key(DEL), Action::Unknown(DEL));
        assert_eq!(Action::for_key(ESC), Action::Unknown(ESC));
    }

    #[test]
    fn test_lone_modifier_keys_send_nothing() {
        assert_eq!(translate_key(key(KeyCode::CapsLock, KeyModifiers::NONE)), None);
        assert_eq!(translate_key(key(KeyCode::Null, KeyModifiers::NONE)), None);
    }
}
