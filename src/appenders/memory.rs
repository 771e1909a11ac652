//! In-memory sink
//!
//! Appends every record it receives to a shared capture buffer. A logger's
//! `bind_memory` sinks all write to the logger's own buffer, which `close`
//! hands back.

use crate::core::{AsyncSink, Payload, Result, Sink};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared capture buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryCaptures {
    records: Arc<Mutex<Vec<String>>>,
}

impl MemoryCaptures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, payload: Payload) {
        self.records.lock().extend(payload.into_records());
    }

    /// Copy of everything captured so far
    pub fn snapshot(&self) -> Vec<String> {
        self.records.lock().clone()
    }

    /// Remove and return everything captured so far
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    captures: MemoryCaptures,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_captures(captures: MemoryCaptures) -> Self {
        Self { captures }
    }

    pub fn captures(&self) -> &MemoryCaptures {
        &self.captures
    }
}

impl Sink for MemorySink {
    fn write(&mut self, payload: Payload) -> Result<()> {
        self.captures.push(payload);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[async_trait]
impl AsyncSink for MemorySink {
    async fn write(&self, payload: Payload) -> Result<()> {
        self.captures.push(payload);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
