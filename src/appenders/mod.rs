//! Sink implementations

pub mod memory;
pub mod stream;

#[cfg(feature = "async-appenders")]
pub mod async_stream;

pub use memory::{MemoryCaptures, MemorySink};
pub use stream::StreamSink;

#[cfg(feature = "async-appenders")]
pub use async_stream::AsyncStreamSink;

// Re-export traits for convenience
pub use crate::core::{AsyncSink, Sink};
