// apiseed
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Leveled logger with an optional file sink.
//!
//! The `Logger` is a backend for the `log` facade, so the regular `log::info!` and friends can be
//! used everywhere.  Two extra levels exist on top of the ones known by `log`: `OUTPUT`, which is
//! always emitted and is reserved for deliberate program output, and `FATAL`, which terminates
//! the process after logging.  These are reached via the `output!` and `fatal!` macros.
//!
//! Every emitted message is formatted as `[LEVEL] timestamp message`, with the timestamp in UTC.
//! Messages are written to stdout (unless in quiet mode) and appended to the log file (if any).
//! If writing to the log file fails, file logging is disabled for the remainder of the process.

use crate::clocks::{Clock, SystemClock};
use derivative::Derivative;
use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use time::macros::format_description;

#[doc(hidden)]
pub use log;

/// `log` target used to tag messages at the `OUTPUT` level.
pub const OUTPUT_TARGET: &str = "apiseed::output";

/// `log` target used to tag messages at the `FATAL` level.
pub const FATAL_TARGET: &str = "apiseed::fatal";

/// Logs a message that is always emitted regardless of the configured level.
#[macro_export]
macro_rules! output {
    ( $($arg:tt)+ ) => {
        $crate::logger::log::log!(
            target: $crate::logger::OUTPUT_TARGET, $crate::logger::log::Level::Error, $($arg)+
        )
    };
}

/// Logs a fatal message and terminates the process with a non-zero exit status.
#[macro_export]
macro_rules! fatal {
    ( $($arg:tt)+ ) => {{
        $crate::logger::log::log!(
            target: $crate::logger::FATAL_TARGET, $crate::logger::log::Level::Error, $($arg)+
        );
        $crate::logger::exit_fatal()
    }};
}

/// Error raised when parsing an unknown level name.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("Invalid log level: {0}")]
pub struct InvalidLevelError(String);

/// Log levels, ordered from most-suppressed to most-verbose.
///
/// A message is emitted when its level is lower than or equal to the configured level.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "&'static str")]
pub enum Level {
    /// Deliberate program output.  Always emitted.
    Output,

    /// Unrecoverable errors.  The process terminates after logging them.
    Fatal,

    /// Errors.
    Error,

    /// Warnings.
    Warn,

    /// Informational messages.
    Info,

    /// Debugging messages.
    Debug,

    /// Very verbose debugging messages.
    Trace,
}

impl Level {
    /// Returns the canonical textual name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Output => "OUTPUT",
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    /// Returns the most verbose `log` filter needed to let messages at this level through.
    ///
    /// `OUTPUT` and `FATAL` travel as `log::Level::Error` records, so the filter never goes
    /// below `Error`.
    fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Level::Output | Level::Fatal | Level::Error => log::LevelFilter::Error,
            Level::Warn => log::LevelFilter::Warn,
            Level::Info => log::LevelFilter::Info,
            Level::Debug => log::LevelFilter::Debug,
            Level::Trace => log::LevelFilter::Trace,
        }
    }

    /// Computes the level of a `log` record based on its `metadata`.
    fn from_metadata(metadata: &log::Metadata<'_>) -> Self {
        match metadata.target() {
            OUTPUT_TARGET => Level::Output,
            FATAL_TARGET => Level::Fatal,
            _ => match metadata.level() {
                log::Level::Error => Level::Error,
                log::Level::Warn => Level::Warn,
                log::Level::Info => Level::Info,
                log::Level::Debug => Level::Debug,
                log::Level::Trace => Level::Trace,
            },
        }
    }
}

impl From<Level> for &'static str {
    fn from(level: Level) -> Self {
        level.as_str()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = InvalidLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OUTPUT" => Ok(Level::Output),
            "FATAL" | "CRITICAL" => Ok(Level::Fatal),
            "ERROR" => Ok(Level::Error),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            "TRACE" => Ok(Level::Trace),
            _ => Err(InvalidLevelError(s.to_owned())),
        }
    }
}

/// A deserialization visitor for a `Level`.
struct LevelVisitor;

impl Visitor<'_> for LevelVisitor {
    type Value = Level;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a log level name")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Level::from_str(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(LevelVisitor)
    }
}

/// Configuration for a `Logger`.
#[derive(Clone, Debug, PartialEq)]
pub struct LoggerOptions {
    /// Most verbose level to emit.
    pub level: Level,

    /// File to which to append log lines, if any.
    pub log_file: Option<PathBuf>,

    /// Whether to suppress writing to the console.
    pub quiet: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self { level: Level::Info, log_file: None, quiet: false }
    }
}

/// Locks `mutex` ignoring poisoning: a panic while logging must not silence the logger.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// The leveled logger.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Logger {
    /// Most verbose level to emit.
    level: Level,

    /// Whether to suppress writing to the console.
    quiet: bool,

    /// File to which to append log lines.  Reset to `None` after the first write error.
    log_file: Mutex<Option<PathBuf>>,

    /// Source of the timestamps in the log lines.
    #[derivative(Debug = "ignore")]
    clock: Box<dyn Clock + Send + Sync>,

    /// Destination of the console output.
    #[derivative(Debug = "ignore")]
    console: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    /// Creates a new logger configured with `opts` that writes to stdout.
    pub fn new(opts: LoggerOptions) -> Self {
        Self {
            level: opts.level,
            quiet: opts.quiet,
            log_file: Mutex::new(opts.log_file),
            clock: Box::from(SystemClock::default()),
            console: Mutex::new(Box::from(io::stdout())),
        }
    }

    /// Replaces the clock used to timestamp log lines.
    pub fn with_clock<C: Clock + Send + Sync + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::from(clock);
        self
    }

    /// Replaces the destination of the console output.
    pub fn with_console<W: Write + Send + 'static>(mut self, console: W) -> Self {
        self.console = Mutex::new(Box::from(console));
        self
    }

    /// Returns the configured level.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the log file currently in use, if file logging has not been disabled.
    pub fn log_file(&self) -> Option<PathBuf> {
        lock(&self.log_file).clone()
    }

    /// Returns true if messages at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Formats a log line for `message` at `level` using the current time.
    fn format_line(&self, level: Level, message: &str) -> String {
        let now = self.clock.now_utc();
        let format = format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
        );
        let timestamp = now.format(&format).unwrap_or_else(|_| now.to_string());
        format!("[{}] {} {}", level, timestamp, message)
    }

    /// Writes `line` to the console regardless of the quiet setting.
    fn write_console(&self, line: &str) {
        let mut console = lock(&self.console);
        // There is nowhere else to report console failures to.
        let _ = writeln!(console, "{}", line);
        let _ = console.flush();
    }

    /// Appends `line` to `path`.
    fn append(path: &Path, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
        file.flush()
    }

    /// Appends `line` to the log file, disabling file logging if that fails.
    fn write_file(&self, line: &str) {
        let mut log_file = lock(&self.log_file);
        if let Some(path) = log_file.as_ref() {
            if let Err(e) = Self::append(path, line) {
                self.write_console(&format!(
                    "Error writing to log file {}: {}",
                    path.display(),
                    e
                ));
                self.write_console("Deactivating writing to log file");
                *log_file = None;
            }
        }
    }

    /// Logs `message` at `level` if the level is enabled.
    pub fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let line = self.format_line(level, message);
        self.write_file(&line);
        if !self.quiet {
            self.write_console(&line);
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        Logger::enabled(self, Level::from_metadata(metadata))
    }

    fn log(&self, record: &log::Record<'_>) {
        let level = Level::from_metadata(record.metadata());
        Logger::log(self, level, &record.args().to_string());
    }

    fn flush(&self) {
        let _ = lock(&self.console).flush();
    }
}

/// Installs `logger` as the process-wide backend of the `log` facade.
///
/// This must be called once at process startup.
pub fn install(logger: Logger) -> Result<(), log::SetLoggerError> {
    let filter = logger.level().as_level_filter();
    log::set_boxed_logger(Box::from(logger))?;
    log::set_max_level(filter);
    Ok(())
}

/// Flushes any pending output of the installed logger.  Call at process teardown.
pub fn flush() {
    log::logger().flush();
}

/// Terminates the process after a fatal message has been logged.
#[doc(hidden)]
pub fn exit_fatal() -> ! {
    flush();
    std::process::exit(1);
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::sync::Arc;

    /// A console sink that captures everything written to it in memory.
    #[derive(Clone, Default)]
    pub struct CapturedConsole(Arc<Mutex<Vec<u8>>>);

    impl CapturedConsole {
        /// Returns the captured output split into lines.
        pub fn lines(&self) -> Vec<String> {
            let contents = lock(&self.0);
            String::from_utf8_lossy(&contents).lines().map(str::to_owned).collect()
        }
    }

    impl Write for CapturedConsole {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            lock(&self.0).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
