use std::error::Error;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use speaking_clock::console;
use speaking_clock::core::config::{self, ConfigError, LoadOutcome, SettingsPaths};

#[derive(Parser)]
#[command(name = "speaking-clock", about = "Speaks the time at the press of a key")]
struct Args {
    /// Increase the debug level
    #[arg(short, long)]
    debug: bool,

    /// Run the setup process
    #[arg(short, long)]
    setup: bool,

    /// Player command for this run, overriding the ts_play setting
    #[arg(long)]
    player: Option<String>,

    /// How often the key reader checks for a quit request, in milliseconds
    #[arg(long, default_value_t = console::DEFAULT_POLL_MS, value_parser = clap::value_parser!(u64).range(10..=5000))]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let paths = SettingsPaths::in_home().and_then(|paths| {
        config::ensure_dir(&paths)?;
        Ok(paths)
    });
    init_logging(&log_path(&paths), args.debug);

    let paths = match paths {
        Ok(paths) => paths,
        Err(e) => {
            log::error!("Settings directory unavailable: {e}");
            println!("Error, severe problem with settings, please fix and restart program");
            println!("Error, {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.debug {
        println!("Debug, increased debug level");
    }
    log::info!("Speaking clock starting, settings in {}", paths.dir.display());

    match run(args, &paths) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error, {e}");
            ExitCode::FAILURE
        }
    }
}

/// The log lives in the settings directory, or in the working directory when
/// that directory is unavailable.
fn log_path(paths: &Result<SettingsPaths, ConfigError>) -> PathBuf {
    match paths {
        Ok(paths) => paths.log_file(),
        Err(_) => PathBuf::from(config::LOG_FILE),
    }
}

// The terminal goes raw while the clock runs, so logs go to a file only.
fn init_logging(path: &Path, debug: bool) {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if let Ok(log_file) = File::create(path) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }
}

fn run(args: Args, paths: &SettingsPaths) -> Result<(), Box<dyn Error>> {
    let (mut settings, problem) = match config::load(paths)? {
        LoadOutcome::Ready(settings) => (settings, None),
        LoadOutcome::NeedsSetup { settings, reason } => (settings, Some(reason)),
    };

    if args.setup || problem.is_some() {
        if let Some(reason) = problem {
            println!("{reason}");
        }
        config::edit(&mut settings, io::stdin().lock(), io::stdout().lock())?;
        config::save(paths, &settings)?;
        println!("Settings saved to {}", paths.file.display());
        return Ok(());
    }

    let resolved = config::resolve(&settings, args.player.as_deref(), &paths.time_file());
    let report = console::run(&resolved, Duration::from_millis(args.poll_ms))?;
    log::info!(
        "Clock stopped ({:?}) after {} action(s), {} keystroke(s) overwritten",
        report.quit_reason,
        report.actions.len(),
        report.dropped_keys
    );
    Ok(())
}
