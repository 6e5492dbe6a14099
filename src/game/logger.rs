//! Centralized match logger
//!
//! Rule-engine diagnostics (skipped steps, malformed content, policy
//! rejections) flow through here rather than panicking or erroring out.
//! Output can go to stdout, an in-memory buffer (used by tests), or both,
//! as text or JSON lines.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};

/// Verbosity level for match output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output
    Silent = 0,
    /// Minimal - match outcome only
    Minimal = 1,
    /// Normal - turns, phases, and key actions (default)
    #[default]
    Normal = 2,
    /// Verbose - every step, skip, and rejection
    Verbose = 3,
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to the in-memory buffer
    Memory,
    /// Both stdout and the buffer
    Both,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// Optional category (e.g. "executor", "loader", "phase")
    pub category: Option<String>,
}

/// Match logger with buffered capture
///
/// Interior mutability keeps the logging API `&self` so read-only borrows of
/// match state can still log.
#[derive(Debug)]
pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    log_buffer: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        GameLogger {
            verbosity: VerbosityLevel::default(),
            output_format: OutputFormat::default(),
            output_mode: OutputMode::default(),
            log_buffer: RefCell::new(Vec::new()),
        }
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        let mut logger = Self::new();
        logger.verbosity = verbosity;
        logger
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn log(&self, level: VerbosityLevel, message: &str, category: Option<&str>) {
        if level > self.verbosity {
            return;
        }
        let entry = LogEntry {
            level,
            message: message.to_string(),
            category: category.map(|c| c.to_string()),
        };
        if matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both) {
            match self.output_format {
                OutputFormat::Text => println!("{message}"),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string(&entry).expect("entry serializes"))
                }
            }
        }
        if matches!(self.output_mode, OutputMode::Memory | OutputMode::Both) {
            self.log_buffer.borrow_mut().push(entry);
        }
    }

    pub fn log_minimal(&self, message: &str) {
        self.log(VerbosityLevel::Minimal, message, None);
    }

    pub fn log_normal(&self, message: &str) {
        self.log(VerbosityLevel::Normal, message, None);
    }

    pub fn log_verbose(&self, message: &str) {
        self.log(VerbosityLevel::Verbose, message, None);
    }

    /// Read-only view of the captured entries
    pub fn buffered(&self) -> Ref<'_, Vec<LogEntry>> {
        self.log_buffer.borrow()
    }

    pub fn clear_buffer(&self) {
        self.log_buffer.borrow_mut().clear();
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Conditional verbose logging that compiles to a no-op without the
/// `verbose-logging` feature, avoiding the format! allocations
#[macro_export]
macro_rules! log_if_verbose {
    ($logger:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $logger.log_verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$logger; // Suppress unused variable warning
        }
    };
}
