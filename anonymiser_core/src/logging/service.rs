//! Logger implementations and the level-filtering service in front of them

use super::codes::Code;
use super::config;
use super::events::{LogEvent, LogLevel, RecordContext};
use crate::config::runtime::LoggingPreferences;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
    include_record_context: bool,
    enabled: bool,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self {
            logger,
            min_level,
            include_record_context: true,
            enabled: true,
        }
    }

    /// Create a service from the installed runtime logging preferences
    pub fn with_config() -> Self {
        Self::from_preferences(&config::get_runtime_preferences())
    }

    /// Console output disabled means no event reaches any logger
    pub fn from_preferences(preferences: &LoggingPreferences) -> Self {
        let min_level = preferences.min_log_level.to_events_log_level();
        let logger: Arc<dyn Logger> = if preferences.use_structured_logging {
            Arc::new(StructuredLogger::new(min_level))
        } else {
            Arc::new(ConsoleLogger::new(min_level))
        };

        let mut service = Self::new(logger, min_level);
        service.include_record_context = preferences.include_record_context;
        service.enabled = preferences.enable_console_logging;
        service
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        self.enabled && level <= self.min_level
    }

    pub fn log_event(&self, mut event: LogEvent) {
        if !self.should_log(event.level) {
            return;
        }
        if !self.include_record_context {
            event.record = None;
        }
        self.logger.log(&event);
    }

    pub fn log_error(&self, error_code: Code, message: &str) {
        self.log_event(LogEvent::error(error_code, message));
    }

    pub fn log_error_with_context(
        &self,
        error_code: Code,
        message: &str,
        context: Vec<(&str, &str)>,
    ) {
        let event = context
            .into_iter()
            .fold(LogEvent::error(error_code, message), |event, (k, v)| {
                event.with_context(k, v)
            });
        self.log_event(event);
    }

    /// Log an error attributed to a specific record
    pub fn log_record_error(&self, error_code: Code, message: &str, record: RecordContext) {
        self.log_event(LogEvent::error(error_code, message).with_record(record));
    }

    pub fn log_info(&self, message: &str) {
        self.log_event(LogEvent::info(message));
    }

    pub fn log_success_with_context(
        &self,
        success_code: Code,
        message: &str,
        context: Vec<(&str, &str)>,
    ) {
        let event = context
            .into_iter()
            .fold(LogEvent::success(success_code, message), |event, (k, v)| {
                event.with_context(k, v)
            });
        self.log_event(event);
    }

    pub fn log_debug(&self, message: &str) {
        self.log_event(LogEvent::debug(message));
    }
}

/// Forwards events to whichever backend is installed for the `log` facade
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        if event.level <= self.min_level {
            log::log!(target: "anonymiser", event.level.to_log_level(), "{}", event.format());
        }
    }
}

/// JSON lines on stdout, errors on stderr
pub struct StructuredLogger {
    min_level: LogLevel,
}

impl StructuredLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        if event.level > self.min_level {
            return;
        }
        let line = event.format_json().unwrap_or_else(|_| event.format());
        match event.level {
            LogLevel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

/// Captures events in memory; used by tests to assert on emitted codes
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_events(&self) -> Vec<LogEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn event_count(&self) -> usize {
        self.lock().len()
    }

    pub fn get_errors(&self) -> Vec<LogEvent> {
        self.lock().iter().filter(|e| e.is_error()).cloned().collect()
    }

    pub fn has_error_with_code(&self, code: Code) -> bool {
        self.lock().iter().any(|e| e.is_error() && e.code == code)
    }

    pub fn has_success_with_code(&self, code: Code) -> bool {
        self.lock().iter().any(|e| e.is_info() && e.code == code)
    }

    pub fn get_events_by_category(&self, category: &str) -> Vec<LogEvent> {
        self.lock()
            .iter()
            .filter(|e| e.category() == category)
            .cloned()
            .collect()
    }

    pub fn get_summary(&self) -> EventSummary {
        let events = self.lock();
        EventSummary {
            total_count: events.len(),
            error_count: events.iter().filter(|e| e.is_error()).count(),
            warning_count: events.iter().filter(|e| e.is_warning()).count(),
            info_count: events.iter().filter(|e| e.is_info()).count(),
            debug_count: events.iter().filter(|e| e.is_debug()).count(),
        }
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let mut events = self.lock();

        let max_events = config::get_log_buffer_size();
        if events.len() >= max_events {
            let remove_count = events.len() - max_events + 1;
            events.drain(0..remove_count);
        }

        events.push(event.clone());
    }
}

#[derive(Debug, Clone)]
pub struct EventSummary {
    pub total_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub debug_count: usize,
}

impl EventSummary {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }
}

/// Fans each event out to several loggers
pub struct MultiLogger {
    loggers: Vec<Arc<dyn Logger>>,
    min_level: LogLevel,
}

impl MultiLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            loggers: Vec::new(),
            min_level,
        }
    }

    pub fn add_logger(&mut self, logger: Arc<dyn Logger>) {
        self.loggers.push(logger);
    }

    pub fn with_console(mut self, console_level: LogLevel) -> Self {
        self.add_logger(Arc::new(ConsoleLogger::new(console_level)));
        self
    }

    pub fn with_memory(mut self) -> (Self, Arc<MemoryLogger>) {
        let memory_logger = Arc::new(MemoryLogger::new());
        self.add_logger(memory_logger.clone());
        (self, memory_logger)
    }
}

impl Logger for MultiLogger {
    fn log(&self, event: &LogEvent) {
        if event.level <= self.min_level {
            for logger in &self.loggers {
                logger.log(event);
            }
        }
    }
}

pub fn create_test_logger() -> Arc<MemoryLogger> {
    Arc::new(MemoryLogger::new())
}
