//! File-backed leveled logging for copyloom.
//!
//! Log levels:
//! - ERROR: Failures that end an operation
//! - WARN: Provider failures that were retried, rejected state transitions
//! - INFO: Operation start/finish, cancellations, snapshot saves and loads
//! - DEBUG: Adherence loop transitions, prompt sizes, provider timings
//! - TRACE: Raw provider replies
//!
//! Lines look like `[12:04:55.120] [DEBUG] copyloom::orchestration::adherence: checking 204/200`.
//! Debug mode can be enabled with the `--debug` flag or `COPYLOOM_DEBUG=1`.
//! `COPYLOOM_LOG` overrides the log file location.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Options for [`init`].
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub debug: bool,
    /// Explicit log file; falls back to `COPYLOOM_LOG`, then `~/.copyloom/copyloom.log`.
    pub path: Option<PathBuf>,
}

impl LogOptions {
    pub fn debug(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn resolve_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .or_else(|| std::env::var_os("COPYLOOM_LOG").map(PathBuf::from))
        .or_else(|| dirs::home_dir().map(|h| h.join(".copyloom").join("copyloom.log")))
}

/// Initialize logging. Only the first call picks the log file.
pub fn init(options: LogOptions) {
    let level = if options.debug || env_flag("COPYLOOM_DEBUG") {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    set_level(level);

    let Some(path) = resolve_path(options.path) else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&path, "");
    LOG_PATH.set(path).ok();
}

pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn get_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn enabled(level: LogLevel) -> bool {
    level <= get_level()
}

fn format_line(level: LogLevel, target: &str, msg: &str) -> String {
    let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
    format!("[{}] [{}] {}: {}", timestamp, level.as_str(), target, msg)
}

/// Write one line at `level`. Silently drops the line when logging was never initialized.
pub fn write(level: LogLevel, target: &str, msg: &str) {
    if !enabled(level) {
        return;
    }
    let Some(path) = LOG_PATH.get() else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", format_line(level, target, msg));
    }
}

#[macro_export]
macro_rules! llog {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::LogLevel::Info, module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! llog_error {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::LogLevel::Error, module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! llog_warn {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::LogLevel::Warn, module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! llog_debug {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::LogLevel::Debug, module_path!(), &format!($($arg)*))
    };
}

/// Provider payloads go here; expensive to format, so check `enabled` first.
#[macro_export]
macro_rules! llog_trace {
    ($($arg:tt)*) => {
        if $crate::log::enabled($crate::log::LogLevel::Trace) {
            $crate::log::write($crate::log::LogLevel::Trace, module_path!(), &format!($($arg)*))
        }
    };
}
