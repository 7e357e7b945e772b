//! Logging infrastructure for docchat.
//!
//! Initializes the tracing subscriber. All logs go to stderr so stdout stays
//! reserved for answers and JSON envelopes.

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Parse a format name ("pretty", "text", "json").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Initialize the tracing subscriber with stderr output.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "debug", "docchat_knowledge=trace")
/// * `format` - Pretty or JSON lines
/// * `no_color` - Disable ANSI colors
///
/// # Example
/// ```no_run
/// use docchat_core::logging::{init_logging, LogFormat};
///
/// init_logging(None, LogFormat::Pretty, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, format: LogFormat, no_color: bool) -> AppResult<()> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = log_level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(!no_color && supports_color()),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true),
            )
            .try_init(),
    };

    result.map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

/// Color only when stderr is a terminal and NO_COLOR is unset.
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" Pretty "), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let result = init_logging(Some("docchat=notalevel"), LogFormat::Pretty, true);
        assert!(result.is_err());
    }
}
