//! Writer bindings: one sink registration with its own level filter,
//! formatter and optional batching buffer

use super::error::{LoggerError, Result};
use super::formatter::Formatter;
use super::level::{LevelId, LevelMask};
use super::log_context::LogContext;
use super::sink::Payload;
use std::fmt;

/// A record that passed the logger's enabled mask, ready for fan-out
#[derive(Debug, Clone)]
pub struct Record {
    /// The single level bit that fired
    pub level: LevelId,
    pub level_name: String,
    /// Message after interpolation
    pub message: String,
    /// Caller context plus processor output
    pub context: LogContext,
}

/// Options for [`Logger::bind`](crate::core::Logger::bind)
///
/// # Example
///
/// ```
/// use bitmask_logger::core::{BindOptions, Level};
///
/// let opts = BindOptions::new()
///     .levels(Level::Warning | Level::Error)
///     .interval(10);
/// ```
#[derive(Clone)]
pub struct BindOptions {
    pub levels: LevelMask,
    pub interval: usize,
    pub formatter: Option<Formatter>,
}

impl BindOptions {
    pub fn new() -> Self {
        Self {
            levels: LevelMask::ALL,
            interval: 1,
            formatter: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: impl Into<LevelMask>) -> Self {
        self.levels = levels.into();
        self
    }

    /// Batch size; `1` writes every record immediately
    #[must_use = "builder methods return a new value"]
    pub fn interval(mut self, interval: usize) -> Self {
        self.interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }
}

impl Default for BindOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindOptions")
            .field("levels", &self.levels)
            .field("interval", &self.interval)
            .field("formatter", &self.formatter.as_ref().map(|_| "custom"))
            .finish()
    }
}

pub struct WriterBinding<S> {
    levels: LevelMask,
    formatter: Formatter,
    interval: usize,
    /// Only used when `interval > 1`
    buffer: Vec<String>,
    sink: S,
}

impl<S> WriterBinding<S> {
    /// The formatter is fixed here; later changes to the logger's default
    /// formatter do not reach an existing binding.
    pub fn new(sink: S, formatter: Formatter, levels: LevelMask, interval: usize) -> Result<Self> {
        if interval == 0 {
            return Err(LoggerError::config("WriterBinding", "interval must be at least 1"));
        }

        Ok(Self {
            levels,
            formatter,
            interval,
            buffer: if interval > 1 {
                Vec::with_capacity(interval)
            } else {
                Vec::new()
            },
            sink,
        })
    }

    #[inline]
    pub fn accepts(&self, level: LevelId) -> bool {
        self.levels.matches(level)
    }

    /// Format a record and return the payloads that are due
    ///
    /// Unbatched bindings always return exactly one payload for a qualifying
    /// record. Batched bindings return one `Batch` of `interval` records each
    /// time the buffer fills up, and nothing otherwise.
    pub fn accept(&mut self, record: &Record) -> Vec<Payload> {
        if !self.accepts(record.level) {
            return Vec::new();
        }

        let formatted = (self.formatter)(&record.level_name, &record.message, &record.context);
        if !self.is_batched() {
            return vec![Payload::Single(formatted)];
        }

        self.buffer.push(formatted);
        let mut due = Vec::new();
        while self.buffer.len() >= self.interval {
            due.push(Payload::Batch(self.buffer.drain(..self.interval).collect()));
        }
        due
    }

    /// Flush signal: hand out whatever is buffered as one final batch
    pub fn drain(&mut self) -> Option<Payload> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(Payload::Batch(std::mem::take(&mut self.buffer)))
    }

    pub fn levels(&self) -> LevelMask {
        self.levels
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn is_batched(&self) -> bool {
        self.interval > 1
    }

    /// Records waiting for the next batch
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use std::sync::Arc;

    fn plain() -> Formatter {
        Arc::new(|level: &str, message: &str, _: &LogContext| format!("{} {}", level, message))
    }

    fn record(level: Level, message: &str) -> Record {
        Record {
            level: level.id(),
            level_name: level.as_str().to_string(),
            message: message.to_string(),
            context: LogContext::new(),
        }
    }

    #[test]
    fn test_unbatched_writes_immediately() {
        let mut binding = WriterBinding::new((), plain(), LevelMask::ALL, 1).unwrap();
        assert!(!binding.is_batched());
        let due = binding.accept(&record(Level::Info, "hi"));
        assert_eq!(due, vec![Payload::Single("info hi".to_string())]);
        assert_eq!(binding.drain(), None);
    }

    #[test]
    fn test_level_filter() {
        let mut binding = WriterBinding::new((), plain(), Level::Error.mask(), 1).unwrap();
        assert!(binding.accept(&record(Level::Warning, "skip")).is_empty());
        assert_eq!(binding.accept(&record(Level::Error, "keep")).len(), 1);
    }

    #[test]
    fn test_batches_at_interval() {
        let mut binding = WriterBinding::new((), plain(), LevelMask::ALL, 3).unwrap();
        assert!(binding.is_batched());
        assert!(binding.accept(&record(Level::Info, "1")).is_empty());
        assert!(binding.accept(&record(Level::Info, "2")).is_empty());

        let due = binding.accept(&record(Level::Info, "3"));
        assert_eq!(
            due,
            vec![Payload::Batch(vec![
                "info 1".to_string(),
                "info 2".to_string(),
                "info 3".to_string()
            ])]
        );

        assert!(binding.accept(&record(Level::Info, "4")).is_empty());
        assert_eq!(binding.buffered(), 1);
        assert_eq!(
            binding.drain(),
            Some(Payload::Batch(vec!["info 4".to_string()]))
        );
        assert_eq!(binding.buffered(), 0);
        assert_eq!(binding.drain(), None);
    }

    #[test]
    fn test_filtered_record_not_buffered() {
        let mut binding = WriterBinding::new((), plain(), Level::Debug.mask(), 2).unwrap();
        binding.accept(&record(Level::Alert, "x"));
        assert_eq!(binding.buffered(), 0);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            WriterBinding::new((), plain(), LevelMask::ALL, 0),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }
}
