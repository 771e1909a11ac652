//! Logging macros for per-level calls and inline context.
//!
//! The message is a template: `{key}` placeholders are filled from the
//! context when the record is dispatched, so the macros never run
//! `format!` over it.
//!
//! # Examples
//!
//! ```
//! use bitmask_logger::prelude::*;
//! use bitmask_logger::{info, warning};
//!
//! let mut logger = Logger::standalone("app");
//! logger.bind_memory(BindOptions::new()).unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started").unwrap();
//!
//! // With context
//! warning!(logger, "Disk {disk} at {usage}%", "disk" => "/var", "usage" => 91).unwrap();
//!
//! assert!(logger.logs()[1].contains("Disk /var at 91%"));
//! ```
//!
//! With an [`AsyncLogger`](crate::core::AsyncLogger) the macros expand to the
//! `log` future, which must be awaited.

/// Build a [`LogContext`](crate::core::LogContext) from `key => value` pairs.
///
/// # Examples
///
/// ```
/// use bitmask_logger::context;
///
/// let ctx = context!("user" => "alice", "attempts" => 3);
/// assert_eq!(ctx.len(), 2);
/// assert!(context!().is_empty());
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::core::LogContext::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::core::LogContext::new()$(.with_field($key, $value))+
    };
}

/// Log a message at any level, by [`Level`](crate::core::Level), name or
/// [`LevelId`](crate::core::LevelId).
///
/// # Examples
///
/// ```
/// # use bitmask_logger::prelude::*;
/// # let mut logger = Logger::builder("app").custom_level("audit").build().unwrap();
/// use bitmask_logger::log;
/// log!(logger, Level::Info, "Simple message").unwrap();
/// log!(logger, "audit", "{user} signed in", "user" => "bob").unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $message:expr $(,)?) => {
        $logger.log($level, $message, $crate::core::LogContext::new())
    };
    ($logger:expr, $level:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $logger.log($level, $message, $crate::context!($($key => $value),+))
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use bitmask_logger::prelude::*;
/// # let mut logger = Logger::standalone("app");
/// use bitmask_logger::info;
/// info!(logger, "Application started").unwrap();
/// info!(logger, "Processing {count} items", "count" => 100).unwrap();
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Info, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Notice, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use bitmask_logger::prelude::*;
/// # let mut logger = Logger::standalone("app");
/// use bitmask_logger::error;
/// let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml");
/// error!(logger, "Load failed: {err}", "err" => FieldValue::error(&err)).unwrap();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Critical, $($arg)+)
    };
}

/// Log an alert-level message.
#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Alert, $($arg)+)
    };
}

/// Log an emergency-level message.
#[macro_export]
macro_rules! emergency {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::Level::Emergency, $($arg)+)
    };
}
