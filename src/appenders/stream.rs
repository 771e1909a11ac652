//! Stream sink: stdout, stderr or an append-mode file
//!
//! Unbatched payloads are written as `record\n`, batches as the records
//! joined by `\n` with a trailing newline. Each payload is flushed before
//! `write` returns.

use crate::core::{LoggerError, Payload, Result, Sink};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

pub const STDOUT: &str = "stdout";
pub const STDERR: &str = "stderr";

enum StreamTarget {
    Stdout,
    Stderr,
    File(BufWriter<File>),
}

pub struct StreamSink {
    destination: String,
    target: Arc<Mutex<Option<StreamTarget>>>,
}

impl StreamSink {
    /// Open `destination`: `"stdout"`, `"stderr"` or a file path
    pub fn open(destination: &str) -> Result<Self> {
        let target = match destination {
            STDOUT => StreamTarget::Stdout,
            STDERR => StreamTarget::Stderr,
            path => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(Path::new(path))
                    .map_err(|e| {
                        LoggerError::sink_unavailable(
                            path,
                            format!("the stream cannot be created or opened: {}", e),
                        )
                    })?;
                StreamTarget::File(BufWriter::new(file))
            }
        };

        Ok(Self {
            destination: destination.to_string(),
            target: Arc::new(Mutex::new(Some(target))),
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// True for file destinations, which need closing
    pub fn is_file(&self) -> bool {
        matches!(*self.target.lock(), Some(StreamTarget::File(_)))
    }

    /// Handle that flushes and closes the stream; later writes fail
    pub fn closer(&self) -> impl FnOnce() -> Result<()> + Send + 'static {
        let target = Arc::clone(&self.target);
        move || {
            if let Some(StreamTarget::File(mut writer)) = target.lock().take() {
                writer.flush()?;
            }
            Ok(())
        }
    }
}

impl Sink for StreamSink {
    fn write(&mut self, payload: Payload) -> Result<()> {
        let mut guard = self.target.lock();
        let target = guard.as_mut().ok_or_else(|| {
            LoggerError::sink_unavailable(&self.destination, "stream already closed")
        })?;

        let lines = payload.to_lines();
        match target {
            StreamTarget::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(lines.as_bytes())?;
                out.flush()?;
            }
            StreamTarget::Stderr => {
                let mut err = std::io::stderr().lock();
                err.write_all(lines.as_bytes())?;
                err.flush()?;
            }
            StreamTarget::File(writer) => {
                writer.write_all(lines.as_bytes())?;
                writer.flush()?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.destination
    }
}
