//! Engine logging
//!
//! Messages go through an `EngineLog` handle that every component receives
//! at construction. The handle pairs a `Logger` sink with a minimum
//! severity; the console sink colors its output. Errors also record the
//! file and line they were raised from.

use chrono::{DateTime, Local};
use colored::*;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Destination for engine messages
///
/// ```no_run
/// use vista_engine::vista::log::{LogEntry, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{} {}", entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One message as handed to a `Logger`
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Reporting component, `vista::<Component>`
    pub source: String,
    pub message: String,
    /// Set for errors only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

/// Message severity, least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    /// Dropped submissions and exhausted tables
    Warn,
    /// Device failures; carries file:line
    Error,
}

impl LogSeverity {
    fn to_u8(self) -> u8 {
        match self {
            LogSeverity::Trace => 0,
            LogSeverity::Debug => 1,
            LogSeverity::Info => 2,
            LogSeverity::Warn => 3,
            LogSeverity::Error => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }
}

fn severity_label(severity: LogSeverity) -> ColoredString {
    match severity {
        LogSeverity::Trace => "TRACE".bright_black(),
        LogSeverity::Debug => "DEBUG".cyan(),
        LogSeverity::Info => "INFO ".green(),
        LogSeverity::Warn => "WARN ".yellow(),
        LogSeverity::Error => "ERROR".red().bold(),
    }
}

/// Console sink: `[time] [LEVEL] [source] message`, with ` (file:line)`
/// appended when the entry has a location
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let local: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            local.format("%Y-%m-%d %H:%M:%S%.3f"),
            severity_label(entry.severity),
            entry.source.bright_blue(),
            entry.message
        );
        if let (Some(file), Some(at)) = (entry.file, entry.line) {
            line.push_str(&format!(" ({}:{})", file, at));
        }
        println!("{}", line);
    }
}

// ===== ENGINE LOG HANDLE =====

/// Shared logging handle passed to the renderer and everything it owns.
///
/// Cloning is cheap; all clones share the sink and the minimum level, so
/// `set_level` on any clone applies everywhere.
#[derive(Clone)]
pub struct EngineLog {
    logger: Arc<dyn Logger>,
    level: Arc<AtomicU8>,
}

impl EngineLog {
    pub fn new(logger: Arc<dyn Logger>, level: LogSeverity) -> Self {
        Self {
            logger,
            level: Arc::new(AtomicU8::new(level.to_u8())),
        }
    }

    /// Console logger at `Info`
    pub fn console() -> Self {
        Self::new(Arc::new(DefaultLogger), LogSeverity::Info)
    }

    pub fn level(&self) -> LogSeverity {
        LogSeverity::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LogSeverity) {
        self.level.store(level.to_u8(), Ordering::Relaxed);
    }

    /// True when a message of `severity` would reach the sink
    pub fn enabled(&self, severity: LogSeverity) -> bool {
        severity >= self.level()
    }

    pub fn log(&self, severity: LogSeverity, source: &str, message: String) {
        if !self.enabled(severity) {
            return;
        }
        self.logger.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Log with source location (used by `engine_error!`)
    pub fn log_detailed(
        &self,
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if !self.enabled(severity) {
            return;
        }
        self.logger.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }
}

impl std::fmt::Debug for EngineLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLog").field("level", &self.level()).finish()
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```ignore
/// engine_trace!(self.log, "vista::Frame", "Frame {} opened", id);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($log:expr, $source:expr, $($arg:tt)*) => {{
        let log = &$log;
        if log.enabled($crate::log::LogSeverity::Trace) {
            log.log($crate::log::LogSeverity::Trace, $source, format!($($arg)*));
        }
    }};
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($log:expr, $source:expr, $($arg:tt)*) => {{
        let log = &$log;
        if log.enabled($crate::log::LogSeverity::Debug) {
            log.log($crate::log::LogSeverity::Debug, $source, format!($($arg)*));
        }
    }};
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($log:expr, $source:expr, $($arg:tt)*) => {{
        let log = &$log;
        if log.enabled($crate::log::LogSeverity::Info) {
            log.log($crate::log::LogSeverity::Info, $source, format!($($arg)*));
        }
    }};
}

/// Log a WARN message
///
/// ```ignore
/// engine_warn!(self.log, "vista::Pass", "Opaque element list exhausted");
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($log:expr, $source:expr, $($arg:tt)*) => {{
        let log = &$log;
        if log.enabled($crate::log::LogSeverity::Warn) {
            log.log($crate::log::LogSeverity::Warn, $source, format!($($arg)*));
        }
    }};
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($log:expr, $source:expr, $($arg:tt)*) => {{
        let log = &$log;
        if log.enabled($crate::log::LogSeverity::Error) {
            log.log_detailed(
                $crate::log::LogSeverity::Error,
                $source,
                format!($($arg)*),
                file!(),
                line!(),
            );
        }
    }};
}

/// Log an ERROR and build an `Error::Device` carrying the same message
///
/// ```ignore
/// let buffer = map.get(&id).ok_or_else(|| engine_err!(self.log, "vista::Renderer", "No buffer {}", id))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($log:expr, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $log.log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!(),
        );
        $crate::vista::Error::Device(message)
    }};
}

// ===== TEST CAPTURE =====

/// In-memory sink shared by unit tests across the crate
#[cfg(test)]
pub(crate) struct CaptureLogger {
    pub entries: Arc<std::sync::Mutex<Vec<LogEntry>>>,
}

#[cfg(test)]
impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[cfg(test)]
pub(crate) fn capture_log(level: LogSeverity) -> (EngineLog, Arc<std::sync::Mutex<Vec<LogEntry>>>) {
    let entries = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = EngineLog::new(Arc::new(CaptureLogger { entries: entries.clone() }), level);
    (log, entries)
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
