//! Record formatters
//!
//! A formatter turns `(level name, interpolated message, context)` into the
//! string handed to a sink. Three output formats are provided:
//! - Text: `[<timestamp>] (<logger>): <LEVEL>    '<message>'` (default)
//! - Json: one JSON object per record, context fields merged in
//! - Logfmt: `key=value` pairs

use super::log_context::{FieldValue, LogContext};
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// `(level_name, message, context) -> formatted record`
pub type Formatter = Arc<dyn Fn(&str, &str, &LogContext) -> String + Send + Sync>;

/// The text layout used when a binding does not supply its own formatter
///
/// The level name is upper-cased and left-aligned in ten columns.
pub fn default_formatter(logger_name: impl Into<String>, timestamps: TimestampFormat) -> Formatter {
    OutputFormat::Text.formatter(logger_name, timestamps)
}

/// Text layout with the level colored for terminals
#[cfg(feature = "console")]
pub fn colored_formatter(logger_name: impl Into<String>, timestamps: TimestampFormat) -> Formatter {
    use super::level::Level;
    use colored::Colorize;

    let name = logger_name.into();
    Arc::new(move |level: &str, message: &str, _: &LogContext| {
        let padded = format!("{:<10}", level.to_uppercase());
        let level_str = match level.parse::<Level>() {
            Ok(known) => padded.color(known.color_code()).to_string(),
            Err(_) => padded,
        };
        format!("[{}] ({}): {} '{}'", timestamps.now(), name, level_str, message)
    })
}

/// Output format for records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable text format (default)
    ///
    /// Example: `[Wed, 08 Jan 25 10:30:45 +0000] (app): WARNING    'disk low'`
    #[default]
    Text,

    /// JSON format for machine processing
    ///
    /// Example: `{"level":"warning","logger":"app","message":"disk low","timestamp":"..."}`
    Json,

    /// Logfmt format (key=value pairs)
    ///
    /// Example: `timestamp=... logger=app level=warning message="disk low"`
    Logfmt,
}

impl OutputFormat {
    /// Build a formatter for records of the named logger
    pub fn formatter(&self, logger_name: impl Into<String>, timestamps: TimestampFormat) -> Formatter {
        let name = logger_name.into();
        match self {
            OutputFormat::Text => Arc::new(move |level: &str, message: &str, _: &LogContext| {
                format_text(&name, &timestamps, level, message)
            }),
            OutputFormat::Json => Arc::new(move |level: &str, message: &str, ctx: &LogContext| {
                format_json(&name, &timestamps, level, message, ctx)
            }),
            OutputFormat::Logfmt => Arc::new(move |level: &str, message: &str, ctx: &LogContext| {
                format_logfmt(&name, &timestamps, level, message, ctx)
            }),
        }
    }
}

fn format_text(name: &str, timestamps: &TimestampFormat, level: &str, message: &str) -> String {
    format!(
        "[{}] ({}): {:<10} '{}'",
        timestamps.now(),
        name,
        level.to_uppercase(),
        message
    )
}

fn format_json(
    name: &str,
    timestamps: &TimestampFormat,
    level: &str,
    message: &str,
    ctx: &LogContext,
) -> String {
    use serde_json::Value;

    let mut json_obj = serde_json::Map::new();
    let now = chrono::Utc::now();
    let timestamp = match timestamps {
        TimestampFormat::Unix => Value::Number(now.timestamp().into()),
        TimestampFormat::UnixMillis => Value::Number(now.timestamp_millis().into()),
        _ => Value::String(timestamps.format(&now)),
    };

    json_obj.insert("timestamp".to_string(), timestamp);
    json_obj.insert("logger".to_string(), Value::String(name.to_string()));
    json_obj.insert("level".to_string(), Value::String(level.to_string()));
    json_obj.insert("message".to_string(), Value::String(message.to_string()));

    for (key, value) in ctx.fields() {
        json_obj.insert(key.clone(), value.to_json_value());
    }

    Value::Object(json_obj).to_string()
}

fn format_logfmt(
    name: &str,
    timestamps: &TimestampFormat,
    level: &str,
    message: &str,
    ctx: &LogContext,
) -> String {
    let mut parts = vec![
        format!("timestamp={}", escape_logfmt_value(&timestamps.now())),
        format!("logger={}", escape_logfmt_value(name)),
        format!("level={}", level),
        format!("message={}", quote_logfmt_value(message)),
    ];

    let mut fields: Vec<_> = ctx.fields().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in fields {
        let formatted_value = match value {
            FieldValue::Int(_) | FieldValue::UInt(_) | FieldValue::Float(_) => value.to_string(),
            FieldValue::Bool(_) | FieldValue::Null => value.to_string(),
            other => escape_logfmt_value(&other.to_string()),
        };
        parts.push(format!("{}={}", escape_logfmt_key(key), formatted_value));
    }

    parts.join(" ")
}

/// Escape a logfmt key (remove spaces and special chars)
fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

/// Escape a logfmt value (quote if contains spaces)
fn escape_logfmt_value(value: &str) -> String {
    if value.is_empty() || value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
