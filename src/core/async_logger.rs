//! Asynchronous logger
//!
//! Sink writes may suspend. `log_detached` formats and buffers at call time
//! and leaves the writes in the [`CommitTracker`]; `commit`, `flush`,
//! `close` and an awaited `log` drive them to completion.

use super::{
    commit::{CommitTracker, TaskState, WriteFuture},
    dispatcher::Dispatcher,
    error::Result,
    formatter::{Formatter, OutputFormat},
    level::{LevelId, LevelKey, LevelMask, LevelTable},
    log_context::{FieldValue, LogContext},
    logger::LoggerBuilder,
    metrics::LoggerMetrics,
    processor::{self, Processor},
    registry::Registry,
    sink::{AsyncSink, BlockingSink, Payload, SharedAsyncSink, Sink},
    timestamp::TimestampFormat,
    writer::BindOptions,
};
#[cfg(feature = "async-appenders")]
use crate::appenders::AsyncStreamSink;
use crate::appenders::MemorySink;
#[cfg(not(feature = "async-appenders"))]
use crate::appenders::StreamSink;
use std::fmt;
use std::sync::Arc;

/// Leveled logger over suspending sinks
///
/// # Example
///
/// ```
/// use bitmask_logger::prelude::*;
///
/// # tokio_test::block_on(async {
/// let mut logger = AsyncLogger::standalone("app");
/// logger.bind_memory(BindOptions::new().interval(2)).unwrap();
///
/// for i in 0..3 {
///     logger.log_detached("info", format!("event {i}"), LogContext::new()).await.unwrap();
/// }
/// logger.commit().await.unwrap();
///
/// assert_eq!(logger.logs().len(), 2);
/// assert_eq!(logger.close().await.unwrap().len(), 3);
/// # });
/// ```
pub struct AsyncLogger {
    core: Dispatcher<SharedAsyncSink>,
    tracker: CommitTracker,
}

fn schedule(
    tracker: &mut CommitTracker,
    metrics: &Arc<LoggerMetrics>,
    binding: usize,
    sink: &SharedAsyncSink,
    payload: Payload,
) {
    let sink = Arc::clone(sink);
    let metrics = Arc::clone(metrics);
    let name = sink.name().to_string();
    let write: WriteFuture = Box::pin(async move {
        let result = sink.write(payload).await;
        if result.is_err() {
            metrics.record_failure();
        }
        result
    });
    tracker.track(binding, name, write);
}

impl AsyncLogger {
    pub(crate) fn from_core(core: Dispatcher<SharedAsyncSink>) -> Self {
        Self {
            core,
            tracker: CommitTracker::new(),
        }
    }

    /// Logger registered under `name` in `registry`
    pub fn new(name: impl Into<String>, registry: &Arc<Registry>) -> Result<Self> {
        LoggerBuilder::new(name)
            .registry(Arc::clone(registry))
            .build_async()
    }

    /// Logger outside any registry, with every level enabled
    pub fn standalone(name: impl Into<String>) -> Self {
        let name = name.into();
        let formatter = OutputFormat::Text.formatter(name.clone(), TimestampFormat::Rfc822);
        Self::from_core(Dispatcher::new(
            name,
            LevelTable::new(),
            LevelMask::ALL,
            formatter,
            None,
        ))
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn levels(&self) -> &LevelTable {
        self.core.levels()
    }

    pub fn level(&self, name: &str) -> Option<LevelId> {
        self.core.levels().resolve(name)
    }

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

    pub fn set_default_formatter(&mut self, formatter: Formatter) -> Result<()> {
        self.check_open()?;
        self.core.set_default_formatter(formatter);
        Ok(())
    }

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

    /// A malformed unit closes the logger
    pub async fn add_memory_usage(&mut self, unit: Option<&str>, peak: bool) -> Result<()> {
        self.check_open()?;
        match processor::memory_usage(unit, peak) {
            Ok(memory) => self.register("memory_usage".to_string(), memory),
            Err(err) => {
                self.close_quietly().await;
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

    pub fn processors(&self) -> Vec<String> {
        self.core.processor_keys()
    }

    pub fn bind<S: AsyncSink + 'static>(&mut self, sink: S, options: BindOptions) -> Result<()> {
        self.bind_shared(Arc::new(sink), options)
    }

    /// Bind a sink that is also used elsewhere
    pub fn bind_shared(&mut self, sink: SharedAsyncSink, options: BindOptions) -> Result<()> {
        self.check_open()?;
        self.core.bind(sink, options)
    }

    /// Bind a synchronous sink; its writes complete on first poll
    pub fn bind_blocking<S: Sink + 'static>(&mut self, sink: S, options: BindOptions) -> Result<()> {
        self.bind(BlockingSink::new(sink), options)
    }

    pub fn bind_memory(&mut self, options: BindOptions) -> Result<()> {
        let sink = MemorySink::with_captures(self.core.captures().clone());
        self.bind(sink, options)
    }

    /// Bind `"stdout"`, `"stderr"` or an append-mode file
    ///
    /// With `async-appenders` the stream is an [`AsyncStreamSink`];
    /// otherwise a blocking stream sink. A destination that cannot be
    /// opened closes the logger.
    #[cfg(feature = "async-appenders")]
    pub async fn bind_stream(&mut self, destination: &str, options: BindOptions) -> Result<()> {
        self.check_open()?;
        let sink = match AsyncStreamSink::open(destination).await {
            Ok(sink) => sink,
            Err(err) => {
                self.close_quietly().await;
                return Err(err);
            }
        };
        if sink.path().is_some() {
            self.core.on_close(Box::new(sink.closer()));
        }
        self.bind(sink, options)
    }

    /// Bind `"stdout"`, `"stderr"` or an append-mode file
    ///
    /// A destination that cannot be opened closes the logger.
    #[cfg(not(feature = "async-appenders"))]
    pub async fn bind_stream(&mut self, destination: &str, options: BindOptions) -> Result<()> {
        self.check_open()?;
        let sink = match StreamSink::open(destination) {
            Ok(sink) => sink,
            Err(err) => {
                self.close_quietly().await;
                return Err(err);
            }
        };
        if sink.is_file() {
            self.core.on_close(Box::new(sink.closer()));
        }
        self.bind_blocking(sink, options)
    }

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

    /// Log and wait for every write it issued
    ///
    /// Also drives writes left behind by earlier `log_detached` calls. A
    /// failed write tears the logger down after the healthy bindings drain.
    pub async fn log<'a>(
        &mut self,
        level: impl Into<LevelKey<'a>>,
        message: impl AsRef<str>,
        context: LogContext,
    ) -> Result<()> {
        self.log_detached(level, message, context).await?;
        if let Err(err) = self.tracker.commit().await {
            self.teardown().await;
            return Err(err);
        }
        Ok(())
    }

    /// Log without waiting for the writes
    ///
    /// Formatting and buffering happen now, so each binding sees records in
    /// call order. Returns the number of writes registered.
    pub async fn log_detached<'a>(
        &mut self,
        level: impl Into<LevelKey<'a>>,
        message: impl AsRef<str>,
        context: LogContext,
    ) -> Result<usize> {
        self.ensure_running().await?;

        let level = match self.core.resolve(level.into()) {
            Ok(level) => level,
            Err(err) => {
                self.close_quietly().await;
                return Err(err);
            }
        };

        let Some(record) = self.core.prepare(level, message.as_ref(), context) else {
            return Ok(0);
        };

        let metrics = Arc::clone(self.core.metrics());
        let tracker = &mut self.tracker;
        self.core.issue(&record, |binding, sink, payload| {
            schedule(tracker, &metrics, binding, sink, payload);
            Ok(())
        })
    }

    /// Drain batched bindings and wait for every outstanding write
    pub async fn flush(&mut self) -> Result<()> {
        self.ensure_running().await?;
        self.issue_flush()?;

        if let Err(err) = self.tracker.commit().await {
            self.teardown().await;
            return Err(err);
        }
        Ok(())
    }

    /// Wait for every outstanding write
    ///
    /// Returns immediately when nothing is outstanding. Failures are
    /// reported as `AsyncFailure`; the logger stays open.
    pub async fn commit(&mut self) -> Result<()> {
        self.tracker.commit().await
    }

    /// Outstanding writes
    pub fn pending(&self) -> usize {
        self.tracker.pending()
    }

    pub fn task_states(&self) -> Vec<(u64, TaskState)> {
        self.tracker.states()
    }

    pub fn logs(&self) -> Vec<String> {
        self.core.captures().snapshot()
    }

    pub fn reset_logs(&self) {
        self.core.captures().clear();
    }

    pub async fn close(&mut self) -> Result<Vec<String>> {
        self.close_with(true).await
    }

    /// Flush, commit, run close hooks and release the name
    ///
    /// A failed write is reported after the teardown has finished. A second
    /// call returns the same result as the first.
    pub async fn close_with(&mut self, clear_logs: bool) -> Result<Vec<String>> {
        if let Some(outcome) = self.core.close_outcome() {
            return outcome;
        }

        let issued = self.issue_flush().map(|_| ());
        let committed = self.tracker.commit().await;
        let hooks = self.core.run_close_hooks();
        self.core.release();
        let logs = self.core.take_logs(clear_logs);

        self.core.finish_close(issued.and(committed).and(hooks).map(|()| logs))
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        self.core.metrics()
    }

    fn issue_flush(&mut self) -> Result<usize> {
        let metrics = Arc::clone(self.core.metrics());
        let tracker = &mut self.tracker;
        self.core.issue_flush(|binding, sink, payload| {
            schedule(tracker, &metrics, binding, sink, payload);
            Ok(())
        })
    }

    /// Close after a failed commit
    ///
    /// Bindings whose writes erred are skipped; the rest drain and commit.
    /// Failures of that final commit are reported on stderr.
    async fn teardown(&mut self) {
        for &binding in self.tracker.erred_bindings() {
            self.core.mark_failed(binding);
        }

        let metrics = Arc::clone(self.core.metrics());
        let tracker = &mut self.tracker;
        self.core.drain_survivors(|binding, sink, payload| {
            schedule(tracker, &metrics, binding, sink, payload);
            Ok(())
        });
        if let Err(err) = self.tracker.commit().await {
            eprintln!(
                "[LOGGER ERROR] AsyncLogger('{}') failed to flush during teardown: {}",
                self.core.name(),
                err
            );
        }
        self.core.abandon();
    }

    fn check_open(&self) -> Result<()> {
        if self.core.is_closed() || self.core.is_evicted() {
            return Err(self.core.closed_error());
        }
        Ok(())
    }

    async fn ensure_running(&mut self) -> Result<()> {
        if self.core.is_closed() {
            return Err(self.core.closed_error());
        }
        if self.core.is_evicted() {
            self.close_quietly().await;
            return Err(self.core.closed_error());
        }
        Ok(())
    }

    async fn close_quietly(&mut self) {
        if let Err(err) = self.close_with(false).await {
            eprintln!("[LOGGER ERROR] Logger('{}') failed to close: {}", self.name(), err);
        }
    }
}

impl fmt::Debug for AsyncLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLogger")
            .field("name", &self.core.name())
            .field("enabled", &self.core.enabled())
            .field("writers", &self.core.writer_count())
            .field("pending", &self.tracker.pending())
            .field("closed", &self.core.is_closed())
            .finish()
    }
}

impl Drop for AsyncLogger {
    fn drop(&mut self) {
        if self.core.is_closed() {
            return;
        }

        let pending = self.tracker.pending();
        let buffered = self.core.buffered();
        if pending > 0 || buffered > 0 {
            eprintln!(
                "[LOGGER WARNING] AsyncLogger('{}') dropped without close: {} pending write(s), {} buffered record(s) lost",
                self.core.name(),
                pending,
                buffered
            );
        }
        self.core.abandon();
    }
}

