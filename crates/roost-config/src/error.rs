//! Error types for settings resolution.

use thiserror::Error;

/// Primary error type for settings resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent.
    #[error("missing environment variable")]
    MissingVar {
        /// Name of the absent variable.
        name: &'static str,
    },
    /// An origin value could not be parsed as a URL.
    #[error("origin is not a valid URL")]
    MalformedOrigin {
        /// Variable the origin came from.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Source parse error.
        source: url::ParseError,
    },
    /// An origin value parsed but carries an unusable scheme.
    #[error("origin has an unsupported scheme")]
    UnsupportedScheme {
        /// Variable the origin came from.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the rejection.
        reason: &'static str,
    },
}

/// Convenience alias for settings results.
pub type ConfigResult<T> = Result<T, ConfigError>;
