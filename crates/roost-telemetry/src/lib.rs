//! Logging bootstrap shared by roost embedders.
//!
//! Centralises tracing-subscriber setup so every embedding surface (widget
//! host, render server, tooling) reports diagnostics the same way. The
//! library crates only emit `tracing` events; installing a subscriber is
//! the embedder's call, done once at bootstrap.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON objects, one per line.
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormat {
    /// Pick a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Subscriber options supplied by the embedder.
#[derive(Debug, Clone)]
pub struct LogOptions<'a> {
    /// Filter directive used when `RUST_LOG` is absent.
    pub filter: &'a str,
    /// Output format selection.
    pub format: LogFormat,
}

impl Default for LogOptions<'_> {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER,
            format: LogFormat::infer(),
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed globally.
pub fn init(options: &LogOptions<'_>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(options.filter));
    let registry = tracing_subscriber::registry().with(filter);
    match options.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(false))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).try_init(),
    }
    .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
