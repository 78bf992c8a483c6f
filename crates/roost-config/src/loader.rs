//! Environment resolution for embedder settings.

use once_cell::sync::OnceCell;

use crate::defaults::{
    ANONYMOUS_TOKEN_VAR, APP_NAME_VAR, DEFAULT_APP_NAME, HTTP_ORIGIN_VAR, WS_ORIGIN_VAR,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{Endpoints, Settings};

static ANONYMOUS_TOKEN: OnceCell<String> = OnceCell::new();

impl Settings {
    /// Resolve settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if either origin variable is absent or invalid.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    ///
    /// The indirection keeps resolution testable without mutating the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if either origin variable is absent or invalid.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_origin = lookup(HTTP_ORIGIN_VAR).ok_or(ConfigError::MissingVar {
            name: HTTP_ORIGIN_VAR,
        })?;
        let socket_origin = lookup(WS_ORIGIN_VAR).ok_or(ConfigError::MissingVar {
            name: WS_ORIGIN_VAR,
        })?;
        let endpoints = Endpoints::from_origins(&http_origin, &socket_origin)?;
        let app_name = lookup(APP_NAME_VAR).unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        Ok(Self {
            app_name,
            endpoints,
        })
    }
}

/// The fallback credential substituted when no session token is present.
///
/// Resolved once per process: a runtime override wins over the value embedded
/// at build time. An empty credential is still a valid resolution: requests
/// carrying it are rejected server-side, construction never fails.
#[must_use]
pub fn anonymous_token() -> &'static str {
    ANONYMOUS_TOKEN.get_or_init(|| {
        std::env::var(ANONYMOUS_TOKEN_VAR)
            .ok()
            .or_else(|| option_env!("ROOST_ANONYMOUS_TOKEN").map(str::to_string))
            .unwrap_or_default()
    })
}
