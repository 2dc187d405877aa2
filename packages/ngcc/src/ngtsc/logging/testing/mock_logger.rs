use crate::ngtsc::logging::src::logger::{LogLevel, Logger};
use std::sync::Mutex;

/// A logger that records every message, regardless of level.
#[derive(Default)]
pub struct MockLogger {
    logs: Mutex<Vec<(LogLevel, String)>>,
}

impl MockLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn debug_logs(&self) -> Vec<String> {
        self.messages(LogLevel::Debug)
    }

    pub fn info_logs(&self) -> Vec<String> {
        self.messages(LogLevel::Info)
    }

    pub fn warn_logs(&self) -> Vec<String> {
        self.messages(LogLevel::Warn)
    }

    pub fn error_logs(&self) -> Vec<String> {
        self.messages(LogLevel::Error)
    }

    fn record(&self, level: LogLevel, msg: &str) {
        self.logs.lock().unwrap().push((level, msg.to_string()));
    }
}

impl Logger for MockLogger {
    fn level(&self) -> LogLevel {
        LogLevel::Debug
    }
    fn debug(&self, msg: &str) {
        self.record(LogLevel::Debug, msg);
    }
    fn info(&self, msg: &str) {
        self.record(LogLevel::Info, msg);
    }
    fn warn(&self, msg: &str) {
        self.record(LogLevel::Warn, msg);
    }
    fn error(&self, msg: &str) {
        self.record(LogLevel::Error, msg);
    }
}
