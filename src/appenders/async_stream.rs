//! Async stream sink over tokio I/O
//!
//! Same line layout as [`StreamSink`](super::StreamSink): a single record is
//! written as `record\n`, a batch as its records joined by `\n` plus a
//! trailing newline. Every payload is flushed before its write completes.

use super::stream::{STDERR, STDOUT};
use crate::core::{AsyncSink, LoggerError, Payload, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

enum AsyncTarget {
    Stdout(tokio::io::Stdout),
    Stderr(tokio::io::Stderr),
    File(BufWriter<File>),
}

/// Async writer for `"stdout"`, `"stderr"` or an append-mode file
///
/// # Example
///
/// ```no_run
/// use bitmask_logger::appenders::AsyncStreamSink;
/// use bitmask_logger::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let sink = AsyncStreamSink::open("app.log").await?;
/// let mut logger = AsyncLogger::standalone("app");
/// logger.bind(sink, BindOptions::new().interval(10))?;
///
/// logger.log("info", "started", LogContext::new()).await?;
/// logger.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct AsyncStreamSink {
    destination: String,
    path: Option<PathBuf>,
    target: Arc<Mutex<Option<AsyncTarget>>>,
}

impl AsyncStreamSink {
    /// Default buffer size (64 KB)
    pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

    /// Open `destination`; a file's parent directories are created
    pub async fn open(destination: &str) -> Result<Self> {
        let (target, path) = match destination {
            STDOUT => (AsyncTarget::Stdout(tokio::io::stdout()), None),
            STDERR => (AsyncTarget::Stderr(tokio::io::stderr()), None),
            path => {
                let file = Self::open_file(Path::new(path)).await.map_err(|e| {
                    LoggerError::sink_unavailable(
                        path,
                        format!("the stream cannot be created or opened: {}", e),
                    )
                })?;
                (
                    AsyncTarget::File(BufWriter::with_capacity(Self::DEFAULT_BUFFER_SIZE, file)),
                    Some(PathBuf::from(path)),
                )
            }
        };

        Ok(Self {
            destination: destination.to_string(),
            path,
            target: Arc::new(Mutex::new(Some(target))),
        })
    }

    async fn open_file(path: &Path) -> std::io::Result<File> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        OpenOptions::new().create(true).append(true).open(path).await
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// File path, `None` for stdout / stderr
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flush and release the stream; later writes fail
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(AsyncTarget::File(mut writer)) = self.target.lock().await.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }

    /// Close hook releasing the stream
    ///
    /// Records are flushed per write, so dropping the handle loses nothing.
    /// If a write still holds the stream the hook fails.
    pub fn closer(&self) -> impl FnOnce() -> Result<()> + Send + 'static {
        let target = Arc::clone(&self.target);
        let destination = self.destination.clone();
        move || match target.try_lock() {
            Ok(mut guard) => {
                guard.take();
                Ok(())
            }
            Err(_) => Err(LoggerError::sink_unavailable(
                destination,
                "stream busy while closing",
            )),
        }
    }
}

async fn write_flushed<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[async_trait]
impl AsyncSink for AsyncStreamSink {
    async fn write(&self, payload: Payload) -> Result<()> {
        let lines = payload.to_lines();
        let mut guard = self.target.lock().await;
        let target = guard.as_mut().ok_or_else(|| {
            LoggerError::sink_unavailable(&self.destination, "stream already closed")
        })?;

        match target {
            AsyncTarget::Stdout(out) => write_flushed(out, lines.as_bytes()).await,
            AsyncTarget::Stderr(err) => write_flushed(err, lines.as_bytes()).await,
            AsyncTarget::File(writer) => write_flushed(writer, lines.as_bytes()).await,
        }
    }

    fn name(&self) -> &str {
        &self.destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_async_stream_creates_parent_dirs() {
        let dir = tempdir().expect("Failed to create temp dir");
        let log_path = dir.path().join("nested").join("async.log");

        let sink = AsyncStreamSink::open(log_path.to_str().unwrap())
            .await
            .expect("Failed to open sink");
        assert_eq!(sink.path(), Some(log_path.as_path()));
    }

    #[tokio::test]
    async fn test_async_stream_writes_lines() {
        let dir = tempdir().expect("Failed to create temp dir");
        let log_path = dir.path().join("async.log");

        let sink = AsyncStreamSink::open(log_path.to_str().unwrap()).await.unwrap();
        sink.write(Payload::Single("one".into())).await.unwrap();
        sink.write(Payload::Batch(vec!["two".into(), "three".into()]))
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&log_path)
            .await
            .expect("Failed to read log file");
        assert_eq!(content, "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn test_async_stream_write_after_shutdown() {
        let dir = tempdir().expect("Failed to create temp dir");
        let log_path = dir.path().join("closed.log");

        let sink = AsyncStreamSink::open(log_path.to_str().unwrap()).await.unwrap();
        sink.shutdown().await.unwrap();

        let err = sink.write(Payload::Single("late".into())).await.unwrap_err();
        assert!(matches!(err, LoggerError::SinkUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_closer_releases_stream() {
        let dir = tempdir().expect("Failed to create temp dir");
        let log_path = dir.path().join("hook.log");

        let sink = AsyncStreamSink::open(log_path.to_str().unwrap()).await.unwrap();
        sink.closer()().unwrap();
        assert!(sink.write(Payload::Single("late".into())).await.is_err());
    }
}
