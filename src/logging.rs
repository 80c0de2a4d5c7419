use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Local;
use colored::*;

lazy_static::lazy_static! {
    static ref LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
}

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Open a per-run log file under the user cache dir.
///
/// Stderr output works without this; the file is a best-effort extra.
pub fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    VERBOSE.store(verbose, Ordering::Relaxed);

    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("team-sync")
        .join("logs");

    create_dir_all(&log_dir)?;

    let log_file = log_dir.join(format!("team-sync-{}.log", Local::now().format("%Y%m%d-%H%M%S")));

    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(log_file.clone());
    }

    log_debug(&format!("Logging initialized to: {}", log_file.display()));

    Ok(())
}

pub fn log_error(message: &str) {
    log_with_level(Level::Error, message);
}

pub fn log_warn(message: &str) {
    log_with_level(Level::Warn, message);
}

pub fn log_info(message: &str) {
    log_with_level(Level::Info, message);
}

pub fn log_debug(message: &str) {
    log_with_level(Level::Debug, message);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    fn tag(self) -> ColoredString {
        match self {
            Level::Error => self.as_str().red().bold(),
            Level::Warn => self.as_str().yellow(),
            Level::Info => self.as_str().cyan(),
            Level::Debug => self.as_str().dimmed(),
        }
    }
}

fn log_with_level(level: Level, message: &str) {
    if let Ok(guard) = LOG_FILE.lock() {
        if let Some(log_file) = guard.as_ref() {
            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
            {
                let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                let _ = writeln!(file, "[{}] {} - {}", timestamp, level.as_str(), message);
            }
        }
    }

    // Stdout is reserved for the report so `--format json` stays parseable
    if level != Level::Debug || VERBOSE.load(Ordering::Relaxed) {
        eprintln!("{} {}", level.tag(), message);
    }
}

pub fn get_log_file_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|guard| guard.clone())
}
