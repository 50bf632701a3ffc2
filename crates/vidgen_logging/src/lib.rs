#![deny(missing_docs)]
//! Shared logging utilities for the vidgen workspace.
//!
//! This crate provides the `vg_*` logging macros used by the engine and the
//! command-line app, plus `simplelog` initializers for the global logger.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Default log file name, created in the current working directory.
pub const DEFAULT_LOG_FILE: &str = "vidgen.log";

#[doc(hidden)]
pub use log;

/// Trace-level record through [`log`], tagged with the calling module.
#[macro_export]
macro_rules! vg_trace {
    ($($arg:tt)*) => {
        $crate::log::trace!($($arg)*)
    };
}

/// Debug-level record through [`log`], tagged with the calling module.
#[macro_export]
macro_rules! vg_debug {
    ($($arg:tt)*) => {
        $crate::log::debug!($($arg)*)
    };
}

/// Info-level record through [`log`], tagged with the calling module.
#[macro_export]
macro_rules! vg_info {
    ($($arg:tt)*) => {
        $crate::log::info!($($arg)*)
    };
}

/// Warn-level record through [`log`], tagged with the calling module.
#[macro_export]
macro_rules! vg_warn {
    ($($arg:tt)*) => {
        $crate::log::warn!($($arg)*)
    };
}

/// Error-level record through [`log`], tagged with the calling module.
#[macro_export]
macro_rules! vg_error {
    ($($arg:tt)*) => {
        $crate::log::error!($($arg)*)
    };
}

/// Destination for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the given file (truncated on start).
    File(PathBuf),
    /// Write to the terminal (stderr for warnings, stdout otherwise).
    Terminal,
    /// Write to both the terminal and the given file.
    Both(PathBuf),
    /// Discard all log output.
    Off,
}

/// Installs the global logger for `destination` at `level`.
///
/// An unwritable log file is reported on stderr and left out; any terminal
/// logger is still installed. Only the first call in a process takes effect.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let (terminal, file) = match destination {
        LogDestination::Off => return,
        LogDestination::Terminal => (true, None),
        LogDestination::File(path) => (false, Some(path)),
        LogDestination::Both(path) => (true, Some(path)),
    };

    let config = record_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);
    if terminal {
        loggers.push(terminal_logger(level, config.clone()));
    }
    if let Some(path) = file {
        if let Some(logger) = file_logger(&path, level, config) {
            loggers.push(logger);
        }
    }
    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

/// Terminal logger for test binaries; a no-op once any logger is installed.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let logger: Box<dyn SharedLogger> = terminal_logger(level, Config::default());
    let _ = CombinedLogger::init(vec![logger]);
}

fn record_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn file_logger(path: &Path, level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    File::create(path)
        .map(|file| WriteLogger::new(level, config, file))
        .map_err(|err| eprintln!("vidgen: cannot open log file {}: {err}", path.display()))
        .ok()
}
