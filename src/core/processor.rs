//! Context processors
//!
//! A processor computes one context field per log call. Processors run in
//! registration order and each one sees the fields written by the ones
//! before it. The value a processor returns always replaces whatever the
//! caller supplied under the same key.

use super::error::{LoggerError, Result};
use super::log_context::{FieldValue, LogContext};
use rand::Rng;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A computation that injects one derived value into the context
pub type Processor = Arc<dyn Fn(&LogContext) -> FieldValue + Send + Sync>;

/// Ordered, keyed collection of processors
#[derive(Clone, Default)]
pub struct ProcessorChain {
    processors: Vec<(String, Processor)>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Register `processor` under `key`
    ///
    /// Re-registering a key replaces the processor but keeps its original
    /// position in the chain.
    pub fn register(&mut self, key: impl Into<String>, processor: Processor) {
        let key = key.into();
        match self.processors.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = processor,
            None => self.processors.push((key, processor)),
        }
    }

    /// Run every processor against the context-so-far
    pub fn apply(&self, mut context: LogContext) -> LogContext {
        for (key, processor) in &self.processors {
            let value = processor(&context);
            context.add_field(key.clone(), value);
        }
        context
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.processors.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

/// Unit accepted by the memory usage processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryUnit {
    B,
    KB,
    MB,
    GB,
}

impl MemoryUnit {
    /// Parse `B`, `KB`, `MB` or `GB` (case-sensitive)
    pub fn parse(unit: &str) -> Result<Self> {
        match unit {
            "B" => Ok(MemoryUnit::B),
            "KB" => Ok(MemoryUnit::KB),
            "MB" => Ok(MemoryUnit::MB),
            "GB" => Ok(MemoryUnit::GB),
            other => Err(LoggerError::config(
                "memory_usage",
                format!("Unknown memory format: '{}'", other),
            )),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            MemoryUnit::B => "B",
            MemoryUnit::KB => "KB",
            MemoryUnit::MB => "MB",
            MemoryUnit::GB => "GB",
        }
    }

    fn scale(self, bytes: u64) -> f64 {
        let steps = match self {
            MemoryUnit::B => 0,
            MemoryUnit::KB => 1,
            MemoryUnit::MB => 2,
            MemoryUnit::GB => 3,
        };
        bytes as f64 / 1024f64.powi(steps)
    }
}

thread_local! {
    static THREAD_LABEL_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Thread name, falling back to the thread id; cached per thread
fn thread_label() -> String {
    THREAD_LABEL_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let current = std::thread::current();
                current
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{:?}", current.id()))
            })
            .clone()
    })
}

/// Resident set size of this process in bytes (`peak` for the high-water mark)
#[cfg(target_os = "linux")]
fn resident_memory(peak: bool) -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let field = if peak { "VmHWM:" } else { "VmRSS:" };
    let line = status.lines().find(|line| line.starts_with(field))?;
    let kb: u64 = line[field.len()..]
        .trim()
        .trim_end_matches("kB")
        .trim()
        .parse()
        .ok()?;
    Some(kb * 1024)
}

#[cfg(not(target_os = "linux"))]
fn resident_memory(_peak: bool) -> Option<u64> {
    None
}

/// Constant tag under key `tag`
pub fn tag(tag: impl Into<String>) -> Processor {
    let tag = tag.into();
    Arc::new(move |_: &LogContext| FieldValue::String(tag.clone()))
}

/// Constant string value, e.g. an application version
pub fn constant(value: impl Into<FieldValue>) -> Processor {
    let value = value.into();
    Arc::new(move |_: &LogContext| value.clone())
}

/// `prefix` followed by 13 hex digits: 8 of epoch seconds, 5 random
pub fn unique_id(prefix: impl Into<String>) -> Processor {
    let prefix = prefix.into();
    Arc::new(move |_: &LogContext| {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let noise: u32 = rand::thread_rng().gen_range(0..0x10_0000);
        FieldValue::String(format!("{}{:08x}{:05x}", prefix, secs & 0xffff_ffff, noise))
    })
}

pub fn pid() -> Processor {
    Arc::new(|_: &LogContext| FieldValue::UInt(std::process::id() as u64))
}

/// Seconds since the epoch; a float with microsecond precision when `micro`
pub fn timestamp(micro: bool) -> Processor {
    Arc::new(move |_: &LogContext| {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        if micro {
            FieldValue::Float(now.as_micros() as f64 / 1_000_000.0)
        } else {
            FieldValue::UInt(now.as_secs())
        }
    })
}

/// Process memory usage, raw bytes or `"%.3f <unit>"`
///
/// Yields `null` on platforms where memory usage cannot be read.
pub fn memory_usage(unit: Option<&str>, peak: bool) -> Result<Processor> {
    let unit = unit.map(MemoryUnit::parse).transpose()?;
    Ok(Arc::new(move |_: &LogContext| match (resident_memory(peak), unit) {
        (None, _) => FieldValue::Null,
        (Some(bytes), None) => FieldValue::UInt(bytes),
        (Some(bytes), Some(unit)) => {
            FieldValue::String(format!("{:.3} {}", unit.scale(bytes), unit.as_str()))
        }
    }))
}

pub fn thread_name() -> Processor {
    Arc::new(|_: &LogContext| FieldValue::String(thread_label()))
}
