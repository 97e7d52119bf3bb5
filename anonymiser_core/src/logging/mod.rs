//! Global logging for the anonymiser
//!
//! A single [`LoggingService`] is installed once per process. Engine code logs
//! through the `log_*!` macros, which are silent until the service exists, so
//! library users that never initialise logging pay only for the macro check.
//!
//! While a record is being processed the engine sets a thread-local
//! [`RecordContext`]; every event raised inside [`with_record_context`] is
//! tagged with the record type and id.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel, RecordContext};
pub use service::{
    ConsoleLogger, Logger, LoggingService, MemoryLogger, MultiLogger, StructuredLogger,
};

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static RECORD_CONTEXT: RefCell<Option<RecordContext>> = const { RefCell::new(None) };
}

/// Initialise the global service from the runtime logging preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let logging_service = Arc::new(LoggingService::with_config());

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized")?;

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

pub fn get_current_record_context() -> Option<RecordContext> {
    RECORD_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Run `f` with `record` as the current record context, restoring the
/// previous context afterwards
pub fn with_record_context<F, R>(record: RecordContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = RECORD_CONTEXT.with(|ctx| ctx.borrow_mut().replace(record));
    let result = f();
    RECORD_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = previous;
    });
    result
}

fn truncate_message(message: &str) -> &str {
    let max = config::get_max_log_message_length();
    if message.len() <= max {
        return message;
    }
    let mut end = max;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

fn dispatch(mut event: LogEvent, context: Vec<(&str, String)>) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };

    for (key, value) in context {
        event = event.with_context(key, &value);
    }

    if let Some(record) = get_current_record_context() {
        event = event.with_record(record);
    }

    logger.log_event(event);
}

/// Backs `log_error!`
pub fn log_error_with_context(code: Code, message: &str, context: Vec<(&str, String)>) {
    dispatch(LogEvent::error(code, truncate_message(message)), context);
}

/// Backs `log_success!`
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, String)>) {
    dispatch(LogEvent::success(code, truncate_message(message)), context);
}

/// Backs `log_info!`, `log_warning!` and `log_debug!`
pub fn log_uncoded_with_context(level: LogLevel, message: &str, context: Vec<(&str, String)>) {
    let message = truncate_message(message);
    let event = match level {
        LogLevel::Error => LogEvent::error(codes::system::INTERNAL_ERROR, message),
        LogLevel::Warning => LogEvent::warning(message),
        LogLevel::Info => LogEvent::info(message),
        LogLevel::Debug => LogEvent::debug(message),
    };
    dispatch(event, context);
}
