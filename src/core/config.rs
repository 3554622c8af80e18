//! # Settings
//!
//! Key/value settings with a documented default for every key, and a clear
//! override hierarchy: defaults → settings file → env vars → CLI flags.
//!
//! Settings live at `~/.speaking_clock/settings.toml` in a `[user]` table.
//! A missing, empty or unparseable file means the interactive setup editor
//! has to run before the clock can start.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Keys and Defaults
// ============================================================================

pub const SETTINGS_DIR: &str = ".speaking_clock";
pub const SETTINGS_FILE: &str = "settings.toml";
pub const TIME_FILE: &str = "time_file.mp3";
pub const LOG_FILE: &str = "speaking_clock.log";

pub const TS_PLAY: &str = "ts_play";
pub const TTS_URL: &str = "tts_url";
pub const TTS_LANG: &str = "tts_lang";

pub const DEFAULT_PLAYER: &str = "/usr/bin/omxplayer.bin -o alsa";
pub const DEFAULT_TTS_URL: &str = "http://translate.google.com/translate_tts";
pub const DEFAULT_TTS_LANG: &str = "en";

/// One user-editable setting.
#[derive(Debug, Clone, Copy)]
pub struct SettingDef {
    pub key: &'static str,
    pub title: &'static str,
    pub default: &'static str,
    pub help: &'static str,
}

/// Every known setting, in the order the setup editor asks for them.
pub const SETTING_DEFS: &[SettingDef] = &[
    SettingDef {
        key: TS_PLAY,
        title: "Player",
        default: DEFAULT_PLAYER,
        help: "Command to play media with arguments, try \"/usr/bin/omxplayer.bin -o alsa\" or \"vlc -I dummy --novideo --play-and-exit\"",
    },
    SettingDef {
        key: TTS_URL,
        title: "Speech service",
        default: DEFAULT_TTS_URL,
        help: "URL of the text to speech service that turns the time into audio",
    },
    SettingDef {
        key: TTS_LANG,
        title: "Speech language",
        default: DEFAULT_TTS_LANG,
        help: "Language code passed to the speech service, e.g. \"en\" or \"en-gb\"",
    },
];

fn setting_def(key: &str) -> Option<&'static SettingDef> {
    SETTING_DEFS.iter().find(|def| def.key == key)
}

// ============================================================================
// Settings
// ============================================================================

/// On-disk shape (sparse: any key may be missing).
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SettingsFile {
    #[serde(default)]
    pub user: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Stored value, else the key's default, else an empty string.
    pub fn get(&self, key: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .or_else(|| setting_def(key).map(|def| def.default.to_string()))
            .unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn is_stored(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl From<SettingsFile> for Settings {
    fn from(file: SettingsFile) -> Self {
        Self { values: file.user }
    }
}

impl From<&Settings> for SettingsFile {
    fn from(settings: &Settings) -> Self {
        Self {
            user: settings.values.clone(),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    NoHome,
    NotADirectory(PathBuf),
    Io(io::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoHome => write!(f, "could not determine home directory"),
            ConfigError::NotADirectory(path) => {
                write!(f, "\"{}\" is a file and not a directory", path.display())
            }
            ConfigError::Io(e) => write!(f, "settings I/O error: {e}"),
            ConfigError::Serialize(e) => write!(f, "settings serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Paths
// ============================================================================

#[derive(Debug, Clone)]
pub struct SettingsPaths {
    pub dir: PathBuf,
    pub file: PathBuf,
}

impl SettingsPaths {
    /// `~/.speaking_clock/settings.toml`.
    pub fn in_home() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
        Ok(Self::under(home.join(SETTINGS_DIR)))
    }

    pub fn under(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let file = dir.join(SETTINGS_FILE);
        Self { dir, file }
    }

    /// Where synthesized speech is cached before playback.
    pub fn time_file(&self) -> PathBuf {
        self.dir.join(TIME_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }
}

// ============================================================================
// Loading
// ============================================================================

#[derive(Debug)]
pub enum LoadOutcome {
    Ready(Settings),
    /// The file can't be used as-is. `reason` is shown to the user before the
    /// setup editor runs; `settings` holds whatever could be salvaged.
    NeedsSetup { settings: Settings, reason: String },
}

/// Makes sure the settings directory exists. A regular file in its place is
/// fatal.
pub fn ensure_dir(paths: &SettingsPaths) -> Result<(), ConfigError> {
    if paths.dir.is_file() {
        return Err(ConfigError::NotADirectory(paths.dir.clone()));
    }
    if !paths.dir.is_dir() {
        info!("Creating settings directory {}", paths.dir.display());
        fs::create_dir_all(&paths.dir).map_err(ConfigError::Io)?;
    }
    Ok(())
}

pub fn load(paths: &SettingsPaths) -> Result<LoadOutcome, ConfigError> {
    ensure_dir(paths)?;

    let needs_setup = |reason: String| -> Result<LoadOutcome, ConfigError> {
        warn!("{reason}");
        Ok(LoadOutcome::NeedsSetup {
            settings: Settings::default(),
            reason,
        })
    };

    if !paths.file.is_file() {
        return needs_setup(format!(
            "Error, can't open \"{}\" for reading",
            paths.file.display()
        ));
    }

    let contents = match fs::read_to_string(&paths.file) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            return needs_setup(format!(
                "Error, \"{}\" is not valid UTF-8 text",
                paths.file.display()
            ));
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };
    if contents.trim().is_empty() {
        return needs_setup(format!("Error, \"{}\" file is empty", paths.file.display()));
    }

    match toml::from_str::<SettingsFile>(&contents) {
        Ok(file) => {
            info!("Loaded settings from {}", paths.file.display());
            debug!("Settings: {:?}", file);
            Ok(LoadOutcome::Ready(file.into()))
        }
        Err(e) => needs_setup(format!(
            "Error, failed parse config file \"{}\": {e}",
            paths.file.display()
        )),
    }
}

/// Writes the settings file with an atomic rename.
pub fn save(paths: &SettingsPaths, settings: &Settings) -> Result<(), ConfigError> {
    ensure_dir(paths)?;
    let contents =
        toml::to_string_pretty(&SettingsFile::from(settings)).map_err(ConfigError::Serialize)?;
    let tmp = paths.file.with_extension("toml.tmp");
    fs::write(&tmp, contents).map_err(ConfigError::Io)?;
    fs::rename(&tmp, &paths.file).map_err(ConfigError::Io)?;
    info!("Saved settings to {}", paths.file.display());
    Ok(())
}

// ============================================================================
// Setup Editor
// ============================================================================

/// Walks every setting, showing its hint and current value. An empty answer
/// keeps the current value. Works over any line reader and writer.
pub fn edit<R: BufRead, W: Write>(
    settings: &mut Settings,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    writeln!(output, "=== Settings ===")?;
    for def in SETTING_DEFS {
        let current = settings.get(def.key);
        writeln!(output, "Hint: {}", def.help)?;
        write!(output, "{} [{}]: ", def.title, current)?;
        output.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        let entered = line.trim_end();
        if entered.is_empty() {
            settings.set(def.key, current);
        } else {
            debug!("Setting {} changed", def.key);
            settings.set(def.key, entered);
        }
        writeln!(output)?;
    }
    Ok(())
}

// ============================================================================
// Resolution
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub player: String,
    pub tts_url: String,
    pub tts_lang: String,
    pub audio_file: PathBuf,
}

/// Collapse defaults → settings file → env vars → CLI into concrete values.
pub fn resolve(settings: &Settings, cli_player: Option<&str>, time_file: &Path) -> ResolvedConfig {
    resolve_with(settings, cli_player, time_file, |key| std::env::var(key).ok())
}

fn resolve_with(
    settings: &Settings,
    cli_player: Option<&str>,
    time_file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Player: CLI → env → settings → default
    let player = cli_player
        .map(|s| s.to_string())
        .or_else(|| env("SPEAKING_CLOCK_PLAYER"))
        .unwrap_or_else(|| settings.get(TS_PLAY));

    // Speech service URL: env → settings → default
    let tts_url = env("SPEAKING_CLOCK_TTS_URL").unwrap_or_else(|| settings.get(TTS_URL));

    ResolvedConfig {
        player,
        tts_url,
        tts_lang: settings.get(TTS_LANG),
        audio_file: time_file.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_get_falls_back_to_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.get(TS_PLAY), DEFAULT_PLAYER);
        assert_eq!(settings.get(TTS_LANG), "en");
        assert_eq!(settings.get("no_such_key"), "");
    }

    #[test]
    fn test_stored_value_wins_over_default() {
        let mut settings = Settings::default();
        settings.set(TS_PLAY, "mpg123 -q");
        assert_eq!(settings.get(TS_PLAY), "mpg123 -q");
        assert!(settings.is_stored(TS_PLAY));
        assert!(!settings.is_stored(TTS_URL));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[user]
ts_play = "vlc -I dummy --novideo --play-and-exit"
"#;
        let file: SettingsFile = toml::from_str(toml_str).unwrap();
        let settings = Settings::from(file);
        assert_eq!(settings.get(TS_PLAY), "vlc -I dummy --novideo --play-and-exit");
        assert_eq!(settings.get(TTS_URL), DEFAULT_TTS_URL);
    }

    #[test]
    fn test_missing_file_needs_setup() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SettingsPaths::under(dir.path().join(SETTINGS_DIR));
        match load(&paths).unwrap() {
            LoadOutcome::NeedsSetup { reason, .. } => {
                assert!(reason.contains("can't open"));
            }
            other => panic!("expected NeedsSetup, got {other:?}"),
        }
        // The directory is created on the way.
        assert!(paths.dir.is_dir());
    }

    #[test]
    fn test_empty_file_needs_setup() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SettingsPaths::under(dir.path());
        fs::write(&paths.file, "  \n").unwrap();
        match load(&paths).unwrap() {
            LoadOutcome::NeedsSetup { reason, .. } => assert!(reason.contains("is empty")),
            other => panic!("expected NeedsSetup, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_file_needs_setup() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SettingsPaths::under(dir.path());
        fs::write(&paths.file, "[user\nts_play = ").unwrap();
        match load(&paths).unwrap() {
            LoadOutcome::NeedsSetup { reason, .. } => {
                assert!(reason.contains("failed parse config file"));
            }
            other => panic!("expected NeedsSetup, got {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_file_needs_setup() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SettingsPaths::under(dir.path());
        fs::write(&paths.file, b"[user]\nts_play = \"\xff\xfe\"\n").unwrap();
        match load(&paths).unwrap() {
            LoadOutcome::NeedsSetup { settings, reason } => {
                assert!(reason.contains("not valid UTF-8"), "{reason}");
                assert!(!settings.is_stored(TS_PLAY));
            }
            other => panic!("expected NeedsSetup, got {other:?}"),
        }
    }

    #[test]
    fn test_file_in_place_of_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join(SETTINGS_DIR);
        fs::write(&bogus, "not a dir").unwrap();
        let paths = SettingsPaths::under(&bogus);
        assert!(matches!(load(&paths), Err(ConfigError::NotADirectory(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SettingsPaths::under(dir.path());
        let mut settings = Settings::default();
        settings.set(TS_PLAY, "aplay");
        save(&paths, &settings).unwrap();

        match load(&paths).unwrap() {
            LoadOutcome::Ready(loaded) => assert_eq!(loaded.get(TS_PLAY), "aplay"),
            other => panic!("expected Ready, got {other:?}"),
        }
        assert!(!paths.file.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_editor_keeps_current_on_empty_answer() {
        let mut settings = Settings::default();
        settings.set(TS_PLAY, "aplay");
        let input = b"\nhttp://localhost:9000/tts\n\n".as_slice();
        let mut output = Vec::new();

        edit(&mut settings, input, &mut output).unwrap();

        assert_eq!(settings.get(TS_PLAY), "aplay");
        assert_eq!(settings.get(TTS_URL), "http://localhost:9000/tts");
        assert_eq!(settings.get(TTS_LANG), DEFAULT_TTS_LANG);
        // Defaults get written out so the file documents them.
        assert!(settings.is_stored(TTS_LANG));

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.starts_with("=== Settings ==="));
        assert!(shown.contains("Player [aplay]: "));
        assert!(shown.contains("Hint: Command to play media"));
    }

    #[test]
    fn test_editor_stops_cleanly_at_eof() {
        let mut settings = Settings::default();
        edit(&mut settings, b"".as_slice(), io::sink()).unwrap();
        assert_eq!(settings.get(TS_PLAY), DEFAULT_PLAYER);
    }

    #[test]
    fn test_resolve_uses_settings_when_nothing_overrides() {
        let mut settings = Settings::default();
        settings.set(TS_PLAY, "aplay");
        let resolved = resolve_with(&settings, None, Path::new("/tmp/t.mp3"), no_env);
        assert_eq!(resolved.player, "aplay");
        assert_eq!(resolved.tts_url, DEFAULT_TTS_URL);
        assert_eq!(resolved.tts_lang, DEFAULT_TTS_LANG);
        assert_eq!(resolved.audio_file, PathBuf::from("/tmp/t.mp3"));
    }

    #[test]
    fn test_resolve_env_beats_settings_and_cli_beats_env() {
        let mut settings = Settings::default();
        settings.set(TS_PLAY, "aplay");
        let env = |key: &str| match key {
            "SPEAKING_CLOCK_PLAYER" => Some("mpv --no-video".to_string()),
            "SPEAKING_CLOCK_TTS_URL" => Some("http://tts.local/speak".to_string()),
            _ => None,
        };

        let resolved = resolve_with(&settings, None, Path::new("t.mp3"), env);
        assert_eq!(resolved.player, "mpv --no-video");
        assert_eq!(resolved.tts_url, "http://tts.local/speak");

        let resolved = resolve_with(&settings, Some("ffplay -nodisp"), Path::new("t.mp3"), env);
        assert_eq!(resolved.player, "ffplay -nodisp");
    }

    #[test]
    fn test_paths_layout() {
        let paths = SettingsPaths::under("/home/pi/.speaking_clock");
        assert_eq!(paths.file, PathBuf::from("/home/pi/.speaking_clock/settings.toml"));
        assert_eq!(paths.time_file(), PathBuf::from("/home/pi/.speaking_clock/time_file.mp3"));
        assert_eq!(paths.log_file(), PathBuf::from("/home/pi/.speaking_clock/speaking_clock.log"));
    }
}
