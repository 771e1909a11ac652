//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// `log` was called with a level the logger does not know
    #[error("Unknown logger({logger}) level name: '{level}'")]
    UnknownLevel { logger: String, level: String },

    /// A sink could not be opened or written
    #[error("Sink '{destination}' unavailable: {message}")]
    SinkUnavailable {
        destination: String,
        message: String,
    },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// One or more fire-and-forget writes failed before commit
    #[error("{failed} pending write(s) failed, first error: {source}")]
    AsyncFailure {
        failed: usize,
        #[source]
        source: Box<LoggerError>,
    },

    /// A logger with this name is already registered
    #[error("Logger('{name}') already defined")]
    AlreadyExists { name: String },

    /// Operation attempted on a closed logger
    #[error("Logger('{name}') is closed")]
    LoggerClosed { name: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an unknown level error
    pub fn unknown_level(logger: impl Into<String>, level: impl Into<String>) -> Self {
        LoggerError::UnknownLevel {
            logger: logger.into(),
            level: level.into(),
        }
    }

    /// Create a sink unavailable error
    pub fn sink_unavailable(destination: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkUnavailable {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Wrap the first failure observed by a commit
    pub fn async_failure(failed: usize, first: LoggerError) -> Self {
        LoggerError::AsyncFailure {
            failed,
            source: Box::new(first),
        }
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        LoggerError::AlreadyExists { name: name.into() }
    }

    pub fn closed(name: impl Into<String>) -> Self {
        LoggerError::LoggerClosed { name: name.into() }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Rebuild an equal error, for reporting one outcome more than once
    ///
    /// IO errors keep their kind and message. JSON errors become `Other`
    /// with the same display text.
    pub fn replay(&self) -> Self {
        match self {
            LoggerError::UnknownLevel { logger, level } => Self::unknown_level(logger, level),
            LoggerError::SinkUnavailable {
                destination,
                message,
            } => Self::sink_unavailable(destination, message),
            LoggerError::InvalidConfiguration { component, message } => {
                Self::config(component, message)
            }
            LoggerError::AsyncFailure { failed, source } => {
                Self::async_failure(*failed, source.replay())
            }
            LoggerError::AlreadyExists { name } => Self::already_exists(name),
            LoggerError::LoggerClosed { name } => Self::closed(name),
            LoggerError::IoError(err) => {
                LoggerError::IoError(std::io::Error::new(err.kind(), err.to_string()))
            }
            LoggerError::JsonError(err) => Self::other(format!("JSON error: {}", err)),
            LoggerError::WriterError(msg) => Self::writer(msg.as_str()),
            LoggerError::Other(msg) => Self::other(msg.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::unknown_level("app", "verbose");
        assert!(matches!(err, LoggerError::UnknownLevel { .. }));

        let err = LoggerError::config("memory_usage", "Unknown memory format: 'TB'");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::sink_unavailable("/", "Is a directory");
        assert!(matches!(err, LoggerError::SinkUnavailable { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::unknown_level("billing", "LogLevel");
        assert_eq!(
            err.to_string(),
            "Unknown logger(billing) level name: 'LogLevel'"
        );

        let err = LoggerError::already_exists("app");
        assert_eq!(err.to_string(), "Logger('app') already defined");

        let err = LoggerError::sink_unavailable("/", "cannot be created or opened");
        assert_eq!(
            err.to_string(),
            "Sink '/' unavailable: cannot be created or opened"
        );
    }

    #[test]
    fn test_async_failure_keeps_source() {
        use std::error::Error as _;

        let err = LoggerError::async_failure(2, LoggerError::writer("disk full"));
        assert!(err.to_string().starts_with("2 pending write(s) failed"));
        let source = err.source().expect("source retained");
        assert_eq!(source.to_string(), "Writer error: disk full");
    }

    #[test]
    fn test_replay_keeps_variant_and_message() {
        let err = LoggerError::async_failure(1, LoggerError::writer("hook failed"));
        let replayed = err.replay();
        assert!(matches!(
            &replayed,
            LoggerError::AsyncFailure { failed: 1, source } if matches!(**source, LoggerError::WriterError(_))
        ));
        assert_eq!(replayed.to_string(), err.to_string());

        let io = LoggerError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        match io.replay() {
            LoggerError::IoError(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::NotFound);
                assert_eq!(inner.to_string(), "missing");
            }
            other => panic!("unexpected error: {other}"),
        }

        let json = LoggerError::from(serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(json.replay().to_string(), json.to_string());
    }
}
