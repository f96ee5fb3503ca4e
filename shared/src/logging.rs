//! Shared logging utilities for consistent tracing across the pipeline

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per event, for Cloud Logging ingestion
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "compact" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format '{s}'. Valid options: text, json")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Filter directives scoped to the pipeline crates
pub fn filter_directives(log_level: &str) -> String {
    format!("orchestrator={log_level},enricher={log_level},shared={log_level},reqwest=warn,hyper=warn")
}

/// Initialize the global tracing subscriber
pub fn init_tracing(log_level: &str, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::new(filter_directives(log_level));

    match format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .init();
        }
        LogFormat::Json => {
            fmt()
                .with_env_filter(env_filter)
                .json()
                .with_current_span(false)
                .flatten_event(true)
                .init();
        }
    }
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for document-aware info logging
#[macro_export]
macro_rules! doc_info {
    ($document_id:expr, $($arg:tt)*) => {
        tracing::info!(
            document = %$document_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for document-aware warning logging
#[macro_export]
macro_rules! doc_warn {
    ($document_id:expr, $($arg:tt)*) => {
        tracing::warn!(
            document = %$document_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for document-aware error logging
#[macro_export]
macro_rules! doc_error {
    ($document_id:expr, $($arg:tt)*) => {
        tracing::error!(
            document = %$document_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for document-aware debug logging
#[macro_export]
macro_rules! doc_debug {
    ($document_id:expr, $($arg:tt)*) => {
        tracing::debug!(
            document = %$document_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(timestamp = format_timestamp(), "🚀 Starting {}", details);
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(message: &str) {
    info!(timestamp = format_timestamp(), "✅ {}", message);
}
