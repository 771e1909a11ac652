//! Sink traits for log output destinations
//!
//! A sink receives either one formatted record (unbatched binding) or a
//! batch of records (batched binding).

use super::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// What a binding hands to its sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Single(String),
    Batch(Vec<String>),
}

impl Payload {
    /// Number of records carried
    pub fn len(&self) -> usize {
        match self {
            Payload::Single(_) => 1,
            Payload::Batch(batch) => batch.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Payload::Batch(_))
    }

    /// Records as a vector regardless of shape
    pub fn into_records(self) -> Vec<String> {
        match self {
            Payload::Single(record) => vec![record],
            Payload::Batch(batch) => batch,
        }
    }

    /// Records joined by `'\n'` with a trailing newline
    pub fn to_lines(&self) -> String {
        match self {
            Payload::Single(record) => format!("{}\n", record),
            Payload::Batch(batch) => {
                let mut out = batch.join("\n");
                out.push('\n');
                out
            }
        }
    }
}

/// Synchronous sink
pub trait Sink: Send {
    fn write(&mut self, payload: Payload) -> Result<()>;

    fn name(&self) -> &str {
        "sink"
    }
}

/// Plain closures act as sinks
impl<F> Sink for F
where
    F: FnMut(Payload) -> Result<()> + Send,
{
    fn write(&mut self, payload: Payload) -> Result<()> {
        self(payload)
    }

    fn name(&self) -> &str {
        "fn"
    }
}

/// Trait for asynchronous sinks
///
/// Writes may suspend. Sinks are shared as `Arc<dyn AsyncSink>` so every
/// write future owns its sink and can outlive the call that issued it.
///
/// # Example
///
/// ```no_run
/// use bitmask_logger::core::{AsyncSink, Payload, Result};
/// use async_trait::async_trait;
///
/// struct MyAsyncSink;
///
/// #[async_trait]
/// impl AsyncSink for MyAsyncSink {
///     async fn write(&self, payload: Payload) -> Result<()> {
///         // Async write logic
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "my_async_sink"
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncSink: Send + Sync {
    async fn write(&self, payload: Payload) -> Result<()>;

    fn name(&self) -> &str {
        "async_sink"
    }
}

pub type SharedAsyncSink = Arc<dyn AsyncSink>;

/// Runs a synchronous sink inside the async pipeline, completing on first poll
pub struct BlockingSink<S> {
    inner: parking_lot::Mutex<S>,
}

impl<S: Sink> BlockingSink<S> {
    pub fn new(sink: S) -> Self {
        Self {
            inner: parking_lot::Mutex::new(sink),
        }
    }
}

#[async_trait]
impl<S: Sink + 'static> AsyncSink for BlockingSink<S> {
    async fn write(&self, payload: Payload) -> Result<()> {
        self.inner.lock().write(payload)
    }

    fn name(&self) -> &str {
        "blocking"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_lines() {
        assert_eq!(Payload::Single("a".into()).to_lines(), "a\n");
        assert_eq!(
            Payload::Batch(vec!["a".into(), "b".into()]).to_lines(),
            "a\nb\n"
        );
    }

    #[test]
    fn test_payload_len() {
        assert_eq!(Payload::Single("a".into()).len(), 1);
        assert!(Payload::Batch(Vec::new()).is_empty());
        assert!(Payload::Batch(vec!["a".into()]).is_batch());
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        let mut sink = |payload: Payload| {
            seen.extend(payload.into_records());
            Ok::<(), crate::core::LoggerError>(())
        };
        Sink::write(&mut sink, Payload::Single("x".into())).unwrap();
        assert_eq!(seen, vec!["x".to_string()]);
    }
}
