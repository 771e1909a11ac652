//! Logger state shared by the sync and async front ends
//!
//! Owns the level table, enabled mask, processor chain, writer bindings and
//! close hooks. The front ends decide how a due payload reaches its sink.

use super::error::{LoggerError, Result};
use super::formatter::Formatter;
use super::interpolate::interpolate;
use super::level::{LevelId, LevelKey, LevelMask, LevelTable};
use super::log_context::LogContext;
use super::metrics::LoggerMetrics;
use super::processor::{Processor, ProcessorChain};
use super::registry::Membership;
use super::sink::Payload;
use super::writer::{BindOptions, Record, WriterBinding};
use crate::appenders::MemoryCaptures;
use std::sync::Arc;

/// Zero-argument teardown action run by `close`
pub type CloseHook = Box<dyn FnOnce() -> Result<()> + Send>;

pub(crate) struct Dispatcher<S> {
    name: String,
    levels: LevelTable,
    enabled: LevelMask,
    default_formatter: Formatter,
    processors: ProcessorChain,
    writers: Vec<WriterBinding<S>>,
    close_hooks: Vec<CloseHook>,
    captures: MemoryCaptures,
    membership: Option<Membership>,
    metrics: Arc<LoggerMetrics>,
    /// Bindings whose sink failed; the teardown drain skips them
    failed: Vec<usize>,
    /// Result of the first close
    closed: Option<Result<Vec<String>>>,
}

fn replay(outcome: &Result<Vec<String>>) -> Result<Vec<String>> {
    match outcome {
        Ok(logs) => Ok(logs.clone()),
        Err(err) => Err(err.replay()),
    }
}

impl<S> Dispatcher<S> {
    pub(crate) fn new(
        name: String,
        levels: LevelTable,
        enabled: LevelMask,
        default_formatter: Formatter,
        membership: Option<Membership>,
    ) -> Self {
        Self {
            name,
            levels,
            enabled,
            default_formatter,
            processors: ProcessorChain::new(),
            writers: Vec::new(),
            close_hooks: Vec::new(),
            captures: MemoryCaptures::new(),
            membership,
            metrics: Arc::new(LoggerMetrics::new()),
            failed: Vec::new(),
            closed: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub(crate) fn enabled(&self) -> LevelMask {
        self.enabled
    }

    pub(crate) fn metrics(&self) -> &Arc<LoggerMetrics> {
        &self.metrics
    }

    pub(crate) fn captures(&self) -> &MemoryCaptures {
        &self.captures
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    /// Outcome of the first close, if it happened
    pub(crate) fn close_outcome(&self) -> Option<Result<Vec<String>>> {
        self.closed.as_ref().map(replay)
    }

    /// True once a conflicting construction closed this logger from outside
    pub(crate) fn is_evicted(&self) -> bool {
        self.membership.as_ref().is_some_and(Membership::is_evicted)
    }

    pub(crate) fn closed_error(&self) -> LoggerError {
        LoggerError::closed(&self.name)
    }

    pub(crate) fn enable(&mut self, mask: LevelMask) {
        self.enabled = self.enabled | mask;
    }

    pub(crate) fn disable(&mut self, mask: LevelMask) {
        self.enabled = self.enabled & !mask;
    }

    pub(crate) fn set_default_formatter(&mut self, formatter: Formatter) {
        self.default_formatter = formatter;
    }

    pub(crate) fn add_processor(&mut self, key: String, processor: Processor) {
        self.processors.register(key, processor);
    }

    pub(crate) fn processor_keys(&self) -> Vec<String> {
        self.processors.keys().map(str::to_string).collect()
    }

    pub(crate) fn bind(&mut self, sink: S, options: BindOptions) -> Result<()> {
        let formatter = options
            .formatter
            .unwrap_or_else(|| Arc::clone(&self.default_formatter));
        let binding = WriterBinding::new(sink, formatter, options.levels, options.interval)?;
        self.writers.push(binding);
        Ok(())
    }

    pub(crate) fn writer_count(&self) -> usize {
        self.writers.len()
    }

    /// Records waiting in batched bindings
    pub(crate) fn buffered(&self) -> usize {
        self.writers.iter().map(WriterBinding::buffered).sum()
    }

    pub(crate) fn on_close(&mut self, hook: CloseHook) {
        self.close_hooks.push(hook);
    }

    pub(crate) fn resolve(&self, level: LevelKey<'_>) -> Result<LevelId> {
        self.levels
            .resolve_key(level)
            .ok_or_else(|| LoggerError::unknown_level(&self.name, level.to_string()))
    }

    /// Filter, enrich and interpolate; `None` when the level is disabled
    pub(crate) fn prepare(&self, level: LevelId, message: &str, context: LogContext) -> Option<Record> {
        if !self.enabled.matches(level) {
            self.metrics.record_filtered();
            return None;
        }

        let context = self.processors.apply(context);
        let message = interpolate(message, &context);
        self.metrics.record_dispatched();

        Some(Record {
            level,
            level_name: self.levels.name(level).unwrap_or_default().to_string(),
            message,
            context,
        })
    }

    /// Hand a record to every matching binding in registration order
    ///
    /// `emit` receives the binding index and each payload that falls due.
    /// Stops at the first failure and marks that binding failed. Returns
    /// the number of payloads emitted.
    pub(crate) fn issue<F>(&mut self, record: &Record, mut emit: F) -> Result<usize>
    where
        F: FnMut(usize, &mut S, Payload) -> Result<()>,
    {
        let mut issued = 0;
        for (index, writer) in self.writers.iter_mut().enumerate() {
            for payload in writer.accept(record) {
                if let Err(err) = Self::emit_one(&self.metrics, index, writer.sink_mut(), payload, &mut emit) {
                    self.failed.push(index);
                    return Err(err);
                }
                issued += 1;
            }
        }
        Ok(issued)
    }

    /// Drain every batched binding's buffer
    pub(crate) fn issue_flush<F>(&mut self, mut emit: F) -> Result<usize>
    where
        F: FnMut(usize, &mut S, Payload) -> Result<()>,
    {
        let mut issued = 0;
        for (index, writer) in self.writers.iter_mut().enumerate() {
            if let Some(payload) = writer.drain() {
                if let Err(err) = Self::emit_one(&self.metrics, index, writer.sink_mut(), payload, &mut emit) {
                    self.failed.push(index);
                    return Err(err);
                }
                issued += 1;
            }
        }
        Ok(issued)
    }

    /// Record that the sink of binding `index` failed
    pub(crate) fn mark_failed(&mut self, index: usize) {
        if !self.failed.contains(&index) {
            self.failed.push(index);
        }
    }

    /// Drain every binding whose sink has not failed
    ///
    /// Keeps going past failures; each one is reported on stderr and marks
    /// its binding failed.
    pub(crate) fn drain_survivors<F>(&mut self, mut emit: F)
    where
        F: FnMut(usize, &mut S, Payload) -> Result<()>,
    {
        for (index, writer) in self.writers.iter_mut().enumerate() {
            if self.failed.contains(&index) {
                continue;
            }
            let Some(payload) = writer.drain() else {
                continue;
            };
            if let Err(err) = Self::emit_one(&self.metrics, index, writer.sink_mut(), payload, &mut emit) {
                eprintln!(
                    "[LOGGER ERROR] Logger('{}') failed to flush writer {} during teardown: {}",
                    self.name, index, err
                );
                self.failed.push(index);
            }
        }
    }

    fn emit_one<F>(
        metrics: &LoggerMetrics,
        index: usize,
        sink: &mut S,
        payload: Payload,
        emit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(usize, &mut S, Payload) -> Result<()>,
    {
        let batch = payload.is_batch();
        match emit(index, sink, payload) {
            Ok(()) => {
                metrics.record_payload(batch);
                Ok(())
            }
            Err(err) => {
                metrics.record_failure();
                Err(err)
            }
        }
    }

    /// Run every close hook in registration order
    ///
    /// All hooks run even if one fails; the first failure is returned.
    pub(crate) fn run_close_hooks(&mut self) -> Result<()> {
        let mut first = None;
        for hook in self.close_hooks.drain(..) {
            if let Err(err) = hook() {
                if first.is_none() {
                    first = Some(err);
                } else {
                    eprintln!("[LOGGER ERROR] Logger('{}') close hook failed: {}", self.name, err);
                }
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Give the name back to the registry
    pub(crate) fn release(&mut self) {
        if let Some(membership) = self.membership.take() {
            membership.release();
        }
    }

    /// Captured records handed out by a close
    pub(crate) fn take_logs(&self, clear_logs: bool) -> Vec<String> {
        if clear_logs {
            self.captures.take()
        } else {
            self.captures.snapshot()
        }
    }

    /// Enter the closed state; later closes replay `outcome`
    pub(crate) fn finish_close(&mut self, outcome: Result<Vec<String>>) -> Result<Vec<String>> {
        let replayed = replay(&outcome);
        self.closed = Some(outcome);
        replayed
    }

    /// Close after a sink failure, draining the healthy bindings first
    ///
    /// Failures past the first are reported on stderr, not returned.
    pub(crate) fn teardown<F>(&mut self, emit: F)
    where
        F: FnMut(usize, &mut S, Payload) -> Result<()>,
    {
        self.drain_survivors(emit);
        self.abandon();
    }

    /// Run the hooks and release the name without flushing
    pub(crate) fn abandon(&mut self) {
        if let Err(err) = self.run_close_hooks() {
            eprintln!("[LOGGER ERROR] Logger('{}') close hook failed: {}", self.name, err);
        }
        self.release();
        let logs = self.take_logs(false);
        self.finish_close(Ok(logs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::formatter::default_formatter;
    use crate::core::level::Level;
    use crate::core::timestamp::TimestampFormat;
    use parking_lot::Mutex;

    fn dispatcher() -> Dispatcher<Vec<Payload>> {
        Dispatcher::new(
            "test".to_string(),
            LevelTable::new(),
            LevelMask::ALL,
            default_formatter("test", TimestampFormat::Unix),
            None,
        )
    }

    fn collect(_: usize, sink: &mut Vec<Payload>, payload: Payload) -> Result<()> {
        sink.push(payload);
        Ok(())
    }

    /// Binding 1 always fails
    fn fail_second(index: usize, sink: &mut Vec<Payload>, payload: Payload) -> Result<()> {
        if index == 1 {
            return Err(LoggerError::writer("rejected"));
        }
        sink.push(payload);
        Ok(())
    }

    #[test]
    fn test_prepare_filters_disabled() {
        let mut core = dispatcher();
        core.disable(Level::Debug.mask());

        assert!(core.prepare(Level::Debug.id(), "x", LogContext::new()).is_none());
        assert_eq!(core.metrics().records_filtered(), 1);
        assert!(core.prepare(Level::Info.id(), "x", LogContext::new()).is_some());
    }

    #[test]
    fn test_prepare_runs_processors_before_interpolation() {
        let mut core = dispatcher();
        core.add_processor("user".to_string(), crate::core::processor::tag("alice"));

        let record = core
            .prepare(Level::Info.id(), "hi {user}", LogContext::new())
            .unwrap();
        assert_eq!(record.message, "hi alice");
        assert_eq!(record.level_name, "info");
    }

    #[test]
    fn test_unknown_level() {
        let core = dispatcher();
        let err = core.resolve(LevelKey::Name("LogLevel")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown logger(test) level name: 'LogLevel'");
    }

    #[test]
    fn test_issue_in_binding_order() {
        let mut core = dispatcher();
        core.bind(Vec::new(), BindOptions::new()).unwrap();
        core.bind(Vec::new(), BindOptions::new().levels(Level::Error)).unwrap();

        let record = core.prepare(Level::Error.id(), "boom", LogContext::new()).unwrap();
        assert_eq!(core.issue(&record, collect).unwrap(), 2);

        let record = core.prepare(Level::Info.id(), "calm", LogContext::new()).unwrap();
        assert_eq!(core.issue(&record, collect).unwrap(), 1);
        assert_eq!(core.metrics().payloads_written(), 3);
    }

    #[test]
    fn test_hooks_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut core = dispatcher();
        for i in 0..3 {
            let order = Arc::clone(&order);
            core.on_close(Box::new(move || {
                order.lock().push(i);
                Ok(())
            }));
        }

        core.run_close_hooks().unwrap();
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_failing_hook_does_not_stop_others() {
        let ran = Arc::new(Mutex::new(false));
        let mut core = dispatcher();
        core.on_close(Box::new(|| Err(LoggerError::writer("gone"))));
        let flag = Arc::clone(&ran);
        core.on_close(Box::new(move || {
            *flag.lock() = true;
            Ok(())
        }));

        assert!(core.run_close_hooks().is_err());
        assert!(*ran.lock());
    }

    #[test]
    fn test_teardown_drains_healthy_bindings() {
        let mut core = dispatcher();
        core.bind(Vec::new(), BindOptions::new().interval(3)).unwrap();
        core.bind(Vec::new(), BindOptions::new().levels(Level::Error)).unwrap();

        let record = core.prepare(Level::Info.id(), "a", LogContext::new()).unwrap();
        assert_eq!(core.issue(&record, fail_second).unwrap(), 0);
        let record = core.prepare(Level::Error.id(), "b", LogContext::new()).unwrap();
        assert!(core.issue(&record, fail_second).is_err());
        assert_eq!(core.buffered(), 2);

        core.teardown(fail_second);
        assert!(core.is_closed());
        assert_eq!(core.buffered(), 0);
        assert_eq!(core.metrics().write_failures(), 1);

        let delivered = core.writers[0].sink_mut();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].len(), 2);
        assert!(delivered[0].is_batch());
    }

    #[test]
    fn test_close_outcome_is_replayed() {
        let mut core = dispatcher();
        assert!(core.close_outcome().is_none());

        let first = core.finish_close(Err(LoggerError::writer("hook failed")));
        assert!(matches!(first, Err(LoggerError::WriterError(_))));
        for _ in 0..2 {
            match core.close_outcome() {
                Some(Err(LoggerError::WriterError(msg))) => assert_eq!(msg, "hook failed"),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }
}
