//! Logging macros over the global logging service
//!
//! Context values may be any `Display` type:
//!
//! ```ignore
//! log_error!(codes::persistence::SAVE_FAILED, "Save failed",
//!     "record_type" => record.record_type(),
//!     "fields" => written.len()
//! );
//! ```

/// Log an error with a code and optional `key => value` context
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_error_with_context($code, $message, ::std::vec::Vec::new())
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

/// Log a success code at info level
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_success_with_context($code, $message, ::std::vec::Vec::new())
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::log_success_with_context(
            $code,
            $message,
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::log_uncoded_with_context(
            $crate::logging::LogLevel::Info,
            $message,
            ::std::vec::Vec::new(),
        )
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::log_uncoded_with_context(
            $crate::logging::LogLevel::Info,
            $message,
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        $crate::logging::log_uncoded_with_context(
            $crate::logging::LogLevel::Warning,
            $message,
            ::std::vec::Vec::new(),
        )
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::log_uncoded_with_context(
            $crate::logging::LogLevel::Warning,
            $message,
            vec![$(($key, format!("{}", $value))),+],
        )
    };
}

/// Debug events skip formatting entirely when the level is filtered out
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::logging::log_uncoded_with_context(
                $crate::logging::LogLevel::Debug,
                $message,
                ::std::vec::Vec::new(),
            )
        }
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::logging::log_uncoded_with_context(
                $crate::logging::LogLevel::Debug,
                $message,
                vec![$(($key, format!("{}", $value))),+],
            )
        }
    };
}
