pub mod compile_time {
    pub mod schema {
        /// Field stamped with the processing time on every overwrite
        pub const DEFAULT_MARKER_FIELD: &str = "anonymised_at";

        /// Maximum length of a configured ignored field name
        /// SECURITY: Prevents memory attacks via huge identifiers
        pub const MAX_FIELD_NAME_LENGTH: usize = 255;
    }

    pub mod strategies {
        /// Length of the hex string produced by `hex` when none is given
        pub const DEFAULT_HEX_LENGTH: usize = 36;

        /// Upper bound on a requested hex length
        /// SECURITY: Prevents memory exhaustion via enormous overwrite values
        pub const MAX_HEX_LENGTH: usize = 4_096;

        /// Template for the `email` strategy; `{}` is replaced by a random UUID
        pub const DEFAULT_EMAIL_TEMPLATE: &str = "anonymous+{}@example.com";

        /// Value written by the `phone_number` strategy
        pub const DEFAULT_PHONE_NUMBER: &str = "+1 617 555 1294";

        /// Names reserved for builder control methods
        pub const PROTECTED_STRATEGY_NAMES: &[&str] = &[
            "apply",
            "destroy",
            "hex",
            "ignore",
            "strategy",
            "valid",
            "validate",
            "with_strategy",
        ];
    }

    pub mod selectors {
        /// Maximum records a single subject query may hand to a bulk apply
        /// RESOURCE: Prevents a runaway selector from anonymising a whole table
        pub const MAX_RECORDS_PER_SUBJECT: usize = 100_000;
    }

    pub mod logging {
        /// Log buffer size for the in-memory logger
        /// RESOURCE: Controls memory usage for logging
        pub const LOG_BUFFER_SIZE: usize = 10_000;

        /// Maximum log message length
        /// RESOURCE: Prevents memory attacks via huge messages
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 10_000;
    }
}
