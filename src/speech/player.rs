//! Plays audio by running the configured player command.
//!
//! The command template is split on whitespace and the audio path is
//! appended as the last argument, so `vlc -I dummy` becomes
//! `vlc -I dummy /path/to/time_file.mp3`.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use crate::speech::{PlaybackError, Player};

#[derive(Debug, Clone)]
pub struct CommandPlayer {
    template: Vec<String>,
}

impl CommandPlayer {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Full argument vector for `audio`, program first. Empty if no command
    /// is configured.
    pub fn command_line(&self, audio: &Path) -> Vec<OsString> {
        if self.template.is_empty() {
            return Vec::new();
        }
        self.template
            .iter()
            .map(OsString::from)
            .chain(std::iter::once(audio.as_os_str().to_owned()))
            .collect()
    }
}

impl Player for CommandPlayer {
    fn play(&self, audio: &Path) -> Result<(), PlaybackError> {
        let argv = self.command_line(audio);
        let (program, args) = argv.split_first().ok_or(PlaybackError::EmptyCommand)?;
        debug!("Player command: {:?}", argv);

        // The reader thread owns stdin; the player must not compete for keys.
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(PlaybackError::Spawn)?;

        if status.success() {
            info!("Played {}", audio.display());
            Ok(())
        } else {
            warn!("Player exited unsuccessfully: {}", status);
            Err(PlaybackError::ExitStatus(status.code()))
        }
    }
}
