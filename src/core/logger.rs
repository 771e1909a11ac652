//! Main logger implementation

use super::{
    async_logger::AsyncLogger,
    dispatcher::Dispatcher,
    error::{LoggerError, Result},
    formatter::{Formatter, OutputFormat},
    level::{LevelId, LevelKey, LevelMask, LevelTable},
    log_context::{FieldValue, LogContext},
    metrics::LoggerMetrics,
    processor::{self, Processor},
    registry::{CollisionPolicy, Registry},
    sink::{Payload, Sink},
    timestamp::TimestampFormat,
    writer::BindOptions,
};
use crate::appenders::{MemorySink, StreamSink};
use std::fmt;
use std::sync::Arc;

/// Synchronous leveled logger
///
/// Every sink write happens inside the call that caused it. A sink
/// failure tears the logger down and is returned to the caller.
///
/// # Example
///
/// ```
/// use bitmask_logger::prelude::*;
///
/// let mut logger = Logger::standalone("app");
/// logger.bind_memory(BindOptions::new()).unwrap();
/// logger
///     .log("warning", "Hello {name}", LogContext::new().with_field("name", "World"))
///     .unwrap();
///
/// let logs = logger.close().unwrap();
/// assert!(logs[0].contains("Hello World"));
/// ```
pub struct Logger {
    core: Dispatcher<Box<dyn Sink>>,
}

fn write_sync(_binding: usize, sink: &mut Box<dyn Sink>, payload: Payload) -> Result<()> {
    sink.as_mut().write(payload)
}

impl Logger {
    /// Logger registered under `name` in `registry`
    pub fn new(name: impl Into<String>, registry: &Arc<Registry>) -> Result<Self> {
        Self::builder(name).registry(Arc::clone(registry)).build()
    }

    /// Logger outside any registry, with the standard levels all enabled
    pub fn standalone(name: impl Into<String>) -> Self {
        let name = name.into();
        let formatter = OutputFormat::Text.formatter(name.clone(), TimestampFormat::Rfc822);
        Self {
            core: Dispatcher::new(name, LevelTable::new(), LevelMask::ALL, formatter, None),
        }
    }

    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn levels(&self) -> &LevelTable {
        self.core.levels()
    }

    /// Handle for a registered level name
    pub fn level(&self, name: &str) -> Option<LevelId> {
        self.core.levels().resolve(name)
    }

    /// Combined mask of the named levels; unknown names are skipped
    pub fn mask<I, S>(&self, names: I) -> LevelMask
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.core.levels().levels(names)
    }

    pub fn enabled(&self) -> LevelMask {
        self.core.enabled()
    }

    /// True if every level in `mask` is enabled
    pub fn is_enabled(&self, mask: impl Into<LevelMask>) -> bool {
        self.core.enabled().contains(mask.into())
    }

    pub fn enable(&mut self, mask: impl Into<LevelMask>) -> Result<()> {
        self.check_open()?;
        self.core.enable(mask.into());
        Ok(())
    }

    pub fn disable(&mut self, mask: impl Into<LevelMask>) -> Result<()> {
        self.check_open()?;
        self.core.disable(mask.into());
        Ok(())
    }

    /// Formatter captured by bindings made after this call
    pub fn set_default_formatter(&mut self, formatter: Formatter) -> Result<()> {
        self.check_open()?;
        self.core.set_default_formatter(formatter);
        Ok(())
    }

    /// Register a context processor; a repeated key replaces the earlier one
    pub fn add_processor<F>(&mut self, key: impl Into<String>, processor: F) -> Result<()>
    where
        F: Fn(&LogContext) -> FieldValue + Send + Sync + 'static,
    {
        self.register(key.into(), Arc::new(processor))
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<()> {
        self.register("tag".to_string(), processor::tag(tag))
    }

    pub fn add_unique_id(&mut self, prefix: impl Into<String>) -> Result<()> {
        self.register("unique_id".to_string(), processor::unique_id(prefix))
    }

    pub fn add_pid(&mut self) -> Result<()> {
        self.register("pid".to_string(), processor::pid())
    }

    pub fn add_timestamp(&mut self, micro: bool) -> Result<()> {
        self.register("timestamp".to_string(), processor::timestamp(micro))
    }

    /// Process memory under `memory_usage`
    ///
    /// `unit` must be one of `B`, `KB`, `MB`, `GB`; anything else closes the
    /// logger and fails.
    pub fn add_memory_usage(&mut self, unit: Option<&str>, peak: bool) -> Result<()> {
        self.check_open()?;
        match processor::memory_usage(unit, peak) {
            Ok(memory) => self.register("memory_usage".to_string(), memory),
            Err(err) => {
                self.close_quietly();
                Err(err)
            }
        }
    }

    pub fn add_thread_name(&mut self) -> Result<()> {
        self.register("thread".to_string(), processor::thread_name())
    }

    pub fn add_version(&mut self, key: impl Into<String>, version: impl Into<String>) -> Result<()> {
        let version: String = version.into();
        self.register(key.into(), processor::constant(version))
    }

    fn register(&mut self, key: String, processor: Processor) -> Result<()> {
        self.check_open()?;
        self.core.add_processor(key, processor);
        Ok(())
    }

    /// Processor keys in evaluation order
    pub fn processors(&self) -> Vec<String> {
        self.core.processor_keys()
    }

    /// Add a writer binding
    ///
    /// Without a formatter in `options`, the current default formatter is
    /// captured now.
    pub fn bind<S: Sink + 'static>(&mut self, sink: S, options: BindOptions) -> Result<()> {
        self.check_open()?;
        self.core.bind(Box::new(sink), options)
    }

    /// Bind a writer that appends to this logger's in-memory captures
    pub fn bind_memory(&mut self, options: BindOptions) -> Result<()> {
        let sink = MemorySink::with_captures(self.core.captures().clone());
        self.bind(sink, options)
    }

    /// Bind `"stdout"`, `"stderr"` or an append-mode file
    ///
    /// A destination that cannot be opened closes the logger.
    pub fn bind_stream(&mut self, destination: &str, options: BindOptions) -> Result<()> {
        self.check_open()?;
        let sink = match StreamSink::open(destination) {
            Ok(sink) => sink,
            Err(err) => {
                self.close_quietly();
                return Err(err);
            }
        };
        if sink.is_file() {
            self.core.on_close(Box::new(sink.closer()));
        }
        self.bind(sink, options)
    }

    /// Register a teardown action run by `close`
    pub fn on_close<F>(&mut self, hook: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.check_open()?;
        self.core.on_close(Box::new(hook));
        Ok(())
    }

    pub fn writer_count(&self) -> usize {
        self.core.writer_count()
    }

    /// Log a message at `level`
    ///
    /// An unknown level closes the logger and returns `UnknownLevel`.
    /// A disabled level returns immediately.
    pub fn log<'a>(
        &mut self,
        level: impl Into<LevelKey<'a>>,
        message: impl AsRef<str>,
        context: LogContext,
    ) -> Result<()> {
        self.ensure_running()?;

        let level = match self.core.resolve(level.into()) {
            Ok(level) => level,
            Err(err) => {
                self.close_quietly();
                return Err(err);
            }
        };

        let Some(record) = self.core.prepare(level, message.as_ref(), context) else {
            return Ok(());
        };

        if let Err(err) = self.core.issue(&record, write_sync) {
            self.core.teardown(write_sync);
            return Err(err);
        }
        Ok(())
    }

    /// Drain every batched binding
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_running()?;

        if let Err(err) = self.core.issue_flush(write_sync) {
            self.core.teardown(write_sync);
            return Err(err);
        }
        Ok(())
    }

    /// Records captured by `bind_memory` writers so far
    pub fn logs(&self) -> Vec<String> {
        self.core.captures().snapshot()
    }

    pub fn reset_logs(&self) {
        self.core.captures().clear();
    }

    /// Flush, run close hooks, release the name and return the captures
    pub fn close(&mut self) -> Result<Vec<String>> {
        self.close_with(true)
    }

    /// Like [`close`](Self::close); keeps the captures when `clear_logs` is false
    ///
    /// A failing binding does not stop the others from flushing. A second
    /// call returns the same result as the first.
    pub fn close_with(&mut self, clear_logs: bool) -> Result<Vec<String>> {
        if let Some(outcome) = self.core.close_outcome() {
            return outcome;
        }

        let flushed = self.core.issue_flush(write_sync).map(|_| ());
        if flushed.is_err() {
            self.core.drain_survivors(write_sync);
        }
        let hooks = self.core.run_close_hooks();
        self.core.release();
        let logs = self.core.take_logs(clear_logs);

        self.core.finish_close(flushed.and(hooks).map(|()| logs))
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        self.core.metrics()
    }

    fn check_open(&self) -> Result<()> {
        if self.core.is_closed() || self.core.is_evicted() {
            return Err(self.core.closed_error());
        }
        Ok(())
    }

    /// Like `check_open`, but an evicted logger finishes its close first
    fn ensure_running(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Err(self.core.closed_error());
        }
        if self.core.is_evicted() {
            self.close_quietly();
            return Err(self.core.closed_error());
        }
        Ok(())
    }

    fn close_quietly(&mut self) {
        if let Err(err) = self.close_with(false) {
            eprintln!("[LOGGER ERROR] Logger('{}') failed to close: {}", self.name(), err);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.core.name())
            .field("enabled", &self.core.enabled())
            .field("writers", &self.core.writer_count())
            .field("closed", &self.core.is_closed())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.core.is_closed() {
            return;
        }
        if let Err(e) = self.close_with(true) {
            eprintln!("[LOGGER ERROR] Failed to close Logger('{}') during drop: {}", self.name(), e);
        }
    }
}

/// Builder for constructing loggers with a fluent API
///
/// # Example
/// ```
/// use bitmask_logger::prelude::*;
///
/// let registry = Registry::shared();
/// let logger = Logger::builder("app")
///     .custom_level("audit")
///     .enabled_levels(["warning", "error", "audit"])
///     .registry(registry.clone())
///     .build()
///     .unwrap();
///
/// assert!(registry.is_registered("app"));
/// assert_eq!(logger.level("audit").map(|id| id.bits()), Some(0x100));
/// ```
pub struct LoggerBuilder {
    name: String,
    custom_levels: Vec<String>,
    enabled: LevelMask,
    enabled_levels: Option<Vec<String>>,
    default_formatter: Option<Formatter>,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
    registry: Option<Arc<Registry>>,
    collision_policy: CollisionPolicy,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            custom_levels: Vec::new(),
            enabled: LevelMask::ALL,
            enabled_levels: None,
            default_formatter: None,
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
            registry: None,
            collision_policy: CollisionPolicy::default(),
        }
    }

    /// Append a level above the standard eight
    #[must_use = "builder methods return a new value"]
    pub fn custom_level(mut self, name: impl Into<String>) -> Self {
        self.custom_levels.push(name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn custom_levels<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_levels.extend(names.into_iter().map(Into::into));
        self
    }

    /// Initial enabled mask (default: every level)
    #[must_use = "builder methods return a new value"]
    pub fn enabled(mut self, mask: impl Into<LevelMask>) -> Self {
        self.enabled = mask.into();
        self.enabled_levels = None;
        self
    }

    /// Initial enabled levels by name, custom levels included
    ///
    /// An unknown name fails the build.
    #[must_use = "builder methods return a new value"]
    pub fn enabled_levels<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_levels = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Formatter used by bindings that do not bring their own
    ///
    /// Takes precedence over `output_format` and `timestamp_format`.
    #[must_use = "builder methods return a new value"]
    pub fn default_formatter(mut self, formatter: Formatter) -> Self {
        self.default_formatter = Some(formatter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Register the logger's name in `registry`
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    pub fn build(self) -> Result<Logger> {
        Ok(Logger {
            core: self.into_dispatcher()?,
        })
    }

    pub fn build_async(self) -> Result<AsyncLogger> {
        Ok(AsyncLogger::from_core(self.into_dispatcher()?))
    }

    fn into_dispatcher<S>(self) -> Result<Dispatcher<S>> {
        if self.name.is_empty() {
            return Err(LoggerError::config("LoggerBuilder", "logger name must not be empty"));
        }

        let mut levels = LevelTable::new();
        for name in &self.custom_levels {
            levels.extend(name)?;
        }

        let enabled = match &self.enabled_levels {
            Some(names) => {
                let mut mask = LevelMask::NONE;
                for name in names {
                    let id = levels.resolve(name).ok_or_else(|| {
                        LoggerError::config("LoggerBuilder", format!("unknown level '{}'", name))
                    })?;
                    mask |= id.mask();
                }
                mask
            }
            None => self.enabled,
        };

        self.timestamp_format.validate()?;
        let formatter = match self.default_formatter {
            Some(formatter) => formatter,
            None => self
                .output_format
                .formatter(self.name.clone(), self.timestamp_format),
        };

        // Claim the name last so a failed build never evicts anyone
        let membership = self
            .registry
            .as_ref()
            .map(|registry| registry.acquire(&self.name, self.collision_policy))
            .transpose()?;

        Ok(Dispatcher::new(self.name, levels, enabled, formatter, membership))
    }
}
