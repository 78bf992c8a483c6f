//! Well-known names shared across the configuration surface.

/// Path appended to both origins to reach the GraphQL endpoint.
pub const GRAPHQL_PATH: &str = "/v1/graphql";

/// Application name used for storage-key namespacing when none is configured.
pub const DEFAULT_APP_NAME: &str = "roost";

/// Environment variable carrying the HTTP origin of the platform backend.
pub const HTTP_ORIGIN_VAR: &str = "ROOST_HTTP_ORIGIN";

/// Environment variable carrying the socket origin of the platform backend.
pub const WS_ORIGIN_VAR: &str = "ROOST_WS_ORIGIN";

/// Environment variable overriding the namespacing application name.
pub const APP_NAME_VAR: &str = "ROOST_APP_NAME";

/// Environment variable overriding the build-time anonymous credential.
pub const ANONYMOUS_TOKEN_VAR: &str = "ROOST_ANONYMOUS_TOKEN";
