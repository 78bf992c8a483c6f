//! Typed settings models.

use url::Url;

use crate::defaults::GRAPHQL_PATH;
use crate::error::{ConfigError, ConfigResult};

/// Where the embedding process runs.
///
/// The distinction is explicit rather than an ambient global: a browser-like
/// long-lived process gets the duplex socket transport, a server-rendering
/// process does not (a per-request socket is not meaningful there).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Long-lived interactive process; socket transport available.
    Browser,
    /// Request-scoped rendering process; HTTP transport only.
    Server,
}

impl ExecutionContext {
    /// Whether this context supports a persistent duplex connection.
    #[must_use]
    pub const fn supports_socket(self) -> bool {
        matches!(self, Self::Browser)
    }

    /// Whether this is the request-scoped server context.
    #[must_use]
    pub const fn is_server(self) -> bool {
        matches!(self, Self::Server)
    }
}

/// Resolved GraphQL endpoints for both transports.
///
/// The operation path is appended once at construction; accessors are
/// infallible afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    http: Url,
    socket: Url,
}

impl Endpoints {
    /// Build the endpoint pair from two origin strings.
    ///
    /// # Errors
    ///
    /// Returns an error if either origin fails to parse or carries a scheme
    /// unfit for its transport (`http`/`https` for requests, `ws`/`wss` for
    /// the socket).
    pub fn from_origins(http_origin: &str, socket_origin: &str) -> ConfigResult<Self> {
        let http = resolve_origin(crate::defaults::HTTP_ORIGIN_VAR, http_origin, &["http", "https"])?;
        let socket = resolve_origin(crate::defaults::WS_ORIGIN_VAR, socket_origin, &["ws", "wss"])?;
        Ok(Self { http, socket })
    }

    /// Endpoint used for query and mutation operations.
    #[must_use]
    pub const fn http(&self) -> &Url {
        &self.http
    }

    /// Endpoint used for subscription operations.
    #[must_use]
    pub const fn socket(&self) -> &Url {
        &self.socket
    }
}

fn resolve_origin(name: &'static str, value: &str, schemes: &[&str]) -> ConfigResult<Url> {
    let origin = Url::parse(value).map_err(|source| ConfigError::MalformedOrigin {
        name,
        value: value.to_string(),
        source,
    })?;
    if !schemes.contains(&origin.scheme()) {
        return Err(ConfigError::UnsupportedScheme {
            name,
            value: value.to_string(),
            reason: "scheme does not match the transport",
        });
    }
    origin
        .join(GRAPHQL_PATH)
        .map_err(|source| ConfigError::MalformedOrigin {
            name,
            value: value.to_string(),
            source,
        })
}

/// Fully resolved embedder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Application name used to namespace durable storage keys.
    pub app_name: String,
    /// Resolved endpoint pair.
    pub endpoints: Endpoints,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_append_the_operation_path() {
        let endpoints =
            Endpoints::from_origins("https://api.example.com", "wss://api.example.com")
                .expect("valid origins");
        assert_eq!(endpoints.http().as_str(), "https://api.example.com/v1/graphql");
        assert_eq!(endpoints.socket().as_str(), "wss://api.example.com/v1/graphql");
    }

    #[test]
    fn endpoints_reject_mismatched_schemes() {
        let err = Endpoints::from_origins("wss://api.example.com", "wss://api.example.com")
            .expect_err("http origin with socket scheme");
        assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));

        let err = Endpoints::from_origins("https://api.example.com", "https://api.example.com")
            .expect_err("socket origin with http scheme");
        assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
    }

    #[test]
    fn endpoints_reject_garbage() {
        let err = Endpoints::from_origins("not a url", "wss://api.example.com")
            .expect_err("unparseable origin");
        assert!(matches!(err, ConfigError::MalformedOrigin { .. }));
    }

    #[test]
    fn execution_context_predicates() {
        assert!(ExecutionContext::Browser.supports_socket());
        assert!(!ExecutionContext::Server.supports_socket());
        assert!(ExecutionContext::Server.is_server());
        assert!(!ExecutionContext::Browser.is_server());
    }
}
