//! Core logger types and traits

pub mod async_logger;
pub mod commit;
pub mod config;
mod dispatcher;
pub mod error;
pub mod formatter;
pub mod interpolate;
pub mod level;
pub mod log_context;
pub mod logger;
pub mod metrics;
pub mod processor;
pub mod registry;
pub mod sink;
pub mod timestamp;
pub mod writer;

pub use async_logger::AsyncLogger;
pub use commit::{CommitTracker, PendingTask, TaskState, WriteFuture};
pub use config::LoggerConfig;
pub use dispatcher::CloseHook;
pub use error::{LoggerError, Result};
#[cfg(feature = "console")]
pub use formatter::colored_formatter;
pub use formatter::{default_formatter, Formatter, OutputFormat};
pub use interpolate::{interpolate, render_value};
pub use level::{Level, LevelId, LevelKey, LevelMask, LevelTable, MAX_LEVELS};
pub use log_context::{ErrorValue, FieldValue, LogContext};
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use processor::{MemoryUnit, Processor, ProcessorChain};
pub use registry::{CollisionPolicy, Registry};
pub use sink::{AsyncSink, BlockingSink, Payload, SharedAsyncSink, Sink};
pub use timestamp::TimestampFormat;
pub use writer::{BindOptions, Record, WriterBinding};
