//! Logging for drawbridge.
//!
//! Routes the `log` facade to a per-session file (`/tmp/drawbridge.log` on
//! Unix, the temp dir on Windows) so GUI sessions always leave a trail.
//! When `RUST_LOG` is set, output is also mirrored to stderr for terminal
//! debugging.
//!
//! Level precedence: `--log-level` flag, then `RUST_LOG`, then the config
//! file (applied later via [`apply_config_level`]).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Metadata, Record};
use parking_lot::Mutex;

use crate::config::LogLevel;

static LOGGER: OnceLock<FileLogger> = OnceLock::new();

/// True when the level came from the CLI or environment; the config file
/// must not override an explicit choice.
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

/// Location of the session log file.
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/drawbridge.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("drawbridge.log")
    }
}

struct FileLogger {
    file: Option<Mutex<std::fs::File>>,
    mirror_stderr: bool,
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:5}] {}: {}",
            timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if let Some(file) = &self.file {
            let mut file = file.lock();
            let _ = writeln!(file, "{line}");
        }
        if self.mirror_stderr {
            eprintln!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => format!("{}.{:03}", elapsed.as_secs(), elapsed.subsec_millis()),
        Err(_) => "0.000".to_string(),
    }
}

/// Parse `RUST_LOG` as a plain level name. Module-filter syntax is not
/// supported; an unparseable value still turns on stderr mirroring.
fn env_level() -> Option<LevelFilter> {
    let raw = std::env::var("RUST_LOG").ok()?;
    raw.trim().parse::<LevelFilter>().ok()
}

/// Initialize the global logger. Call once, before config load, so config
/// diagnostics are captured too.
pub fn init(cli_level: Option<LogLevel>) {
    let env = env_level();
    let mirror_stderr = std::env::var("RUST_LOG").is_ok();
    let level = cli_level
        .map(LogLevel::to_level_filter)
        .or(env)
        .unwrap_or(LevelFilter::Info);
    LEVEL_PINNED.store(cli_level.is_some() || env.is_some(), Ordering::Relaxed);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(log_path())
        .ok();
    if file.is_none() {
        eprintln!(
            "drawbridge: could not open log file {:?}; file logging disabled",
            log_path()
        );
    }

    let logger = FileLogger {
        file: file.map(Mutex::new),
        mirror_stderr,
    };
    if LOGGER.set(logger).is_ok() {
        // set_logger only fails if a logger is already installed.
        if log::set_logger(LOGGER.get().expect("logger just set")).is_ok() {
            log::set_max_level(level);
        }
    }
}

/// Apply the config file's log level, unless the CLI or environment
/// already pinned one.
pub fn apply_config_level(level: LogLevel) {
    if !LEVEL_PINNED.load(Ordering::Relaxed) {
        log::set_max_level(level.to_level_filter());
    }
}
