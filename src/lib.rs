//! # Bitmask Logger
//!
//! A leveled logging engine: records are filtered by a bitmask of enabled
//! levels, enriched by context processors, interpolated and fanned out to
//! independently configured writer bindings.
//!
//! ## Features
//!
//! - **Bitmask Levels**: Eight standard levels plus custom levels, each one bit
//! - **Interpolation**: `{key}` placeholders filled from the record context
//! - **Batching**: Per-binding level filters, formatters and batch intervals
//! - **Async Commit**: Fire-and-forget writes driven to completion on `commit`
//!
//! ## Example
//!
//! ```
//! use bitmask_logger::prelude::*;
//!
//! let registry = Registry::shared();
//! let mut logger = Logger::new("app", &registry).unwrap();
//! logger.disable(LevelMask::ALL).unwrap();
//! logger.enable(Level::Warning).unwrap();
//! logger.bind_memory(BindOptions::new()).unwrap();
//!
//! logger.log("warning", "Hello {name}", context!("name" => "World")).unwrap();
//! logger.log("debug", "ignored", LogContext::new()).unwrap();
//!
//! let logs = logger.close().unwrap();
//! assert_eq!(logs.len(), 1);
//! assert!(logs[0].contains("Hello World"));
//! assert!(!registry.is_registered("app"));
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{MemoryCaptures, MemorySink, StreamSink};
    pub use crate::context;
    pub use crate::core::{
        AsyncLogger, AsyncSink, BindOptions, CollisionPolicy, FieldValue, Formatter, Level,
        LevelId, LevelMask, LogContext, Logger, LoggerBuilder, LoggerConfig, LoggerError,
        LoggerMetrics, OutputFormat, Payload, Registry, Result, Sink, TaskState, TimestampFormat,
    };
}

pub use appenders::{MemorySink, StreamSink};
pub use core::{
    AsyncLogger, AsyncSink, BindOptions, CollisionPolicy, CommitTracker, FieldValue, Formatter,
    Level, LevelId, LevelKey, LevelMask, LevelTable, LogContext, Logger, LoggerBuilder,
    LoggerConfig, LoggerError, LoggerMetrics, OutputFormat, Payload, Registry, Result, Sink,
    TaskState, TimestampFormat,
};
