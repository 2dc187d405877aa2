// Console Logger
//
// Writes ngcc diagnostics to the terminal, one line group per message.

use super::logger::{LogLevel, Logger};
use std::io::{self, IsTerminal, Write};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";

/// Info messages go to stdout, everything else to stderr.
///
/// Each message is written under the stream lock, so lines from worker threads never interleave.
pub struct ConsoleLogger {
    level: LogLevel,
    colors: bool,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            colors: io::stderr().is_terminal(),
        }
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// The label printed before a message of `level`, if any.
    pub fn prefix(&self, level: LogLevel) -> Option<String> {
        let (label, color) = match level {
            LogLevel::Debug => ("Debug:", None),
            LogLevel::Info => return None,
            LogLevel::Warn => ("Warning:", Some(YELLOW)),
            LogLevel::Error => ("Error:", Some(RED)),
        };
        Some(match color {
            Some(color) if self.colors => format!("{}{}{}", color, label, RESET),
            _ => label.to_string(),
        })
    }

    fn write(&self, level: LogLevel, msg: &str) {
        if !self.is_enabled(level) {
            return;
        }
        let line = match self.prefix(level) {
            Some(prefix) => format!("{} {}", prefix, msg),
            None => msg.to_string(),
        };
        // Nowhere left to report a failed write to the terminal.
        let _ = if level == LogLevel::Info {
            writeln!(io::stdout().lock(), "{}", line)
        } else {
            writeln!(io::stderr().lock(), "{}", line)
        };
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl Logger for ConsoleLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn debug(&self, msg: &str) {
        self.write(LogLevel::Debug, msg);
    }

    fn info(&self, msg: &str) {
        self.write(LogLevel::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.write(LogLevel::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.write(LogLevel::Error, msg);
    }
}
