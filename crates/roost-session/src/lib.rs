//! Session state for the commenting platform client.
//!
//! A session couples the signed-in user identity with the bearer credential
//! minted by the auth provider. Identity is recovered from the auth cookie:
//! its middle segment is a base64-encoded JSON payload whose `sub` claim is
//! the user id. Anything malformed degrades to an anonymous session;
//! parsing is never an error surface.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use tracing::debug;

/// Name of the cookie carrying the session payload.
pub const AUTH_COOKIE_NAME: &str = "roost-session";

/// Signed-in identity plus bearer credential for one viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
    token: Option<String>,
}

impl Session {
    /// A session with no identity and no credential.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session for a known user id and bearer token.
    #[must_use]
    pub fn signed_in(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            token: Some(token.into()),
        }
    }

    /// Recover a session from the auth cookie value, keeping the bearer
    /// token alongside when the provider supplied one.
    ///
    /// An empty or malformed cookie yields an anonymous session carrying
    /// only the token.
    #[must_use]
    pub fn from_cookie(cookie: &str, token: Option<String>) -> Self {
        Self {
            user_id: user_id_from_cookie(cookie),
            token,
        }
    }

    /// The signed-in user id, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// The bearer credential, if the auth provider issued one.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether a user identity is present.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Extract the `sub` claim from a `<header>.<payload>.<signature>` cookie.
///
/// Both padded-standard and url-safe base64 payloads are accepted; the
/// provider has shipped both over time.
#[must_use]
pub fn user_id_from_cookie(cookie: &str) -> Option<String> {
    let payload = cookie.split('.').nth(1)?;
    if payload.is_empty() {
        return None;
    }
    let bytes = STANDARD
        .decode(payload)
        .or_else(|_| URL_SAFE_NO_PAD.decode(payload))
        .ok()
        .or_else(|| {
            debug!("auth cookie payload is not valid base64");
            None
        })?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .inspect_err(|error| debug!(%error, "auth cookie payload is not valid JSON"))
        .ok()?;
    claims
        .get("sub")
        .and_then(serde_json::Value::as_str)
        .filter(|sub| !sub.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_for(claims: &str) -> String {
        format!("header.{}.signature", STANDARD.encode(claims))
    }

    #[test]
    fn extracts_the_subject_claim() {
        let cookie = cookie_for(r#"{"sub":"user-1","exp":1893456000}"#);
        assert_eq!(user_id_from_cookie(&cookie).as_deref(), Some("user-1"));
    }

    #[test]
    fn accepts_url_safe_payloads() {
        let cookie = format!(
            "header.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"sub":"user-2"}"#)
        );
        assert_eq!(user_id_from_cookie(&cookie).as_deref(), Some("user-2"));
    }

    #[test]
    fn malformed_cookies_read_as_anonymous() {
        assert_eq!(user_id_from_cookie(""), None);
        assert_eq!(user_id_from_cookie("no-dots-here"), None);
        assert_eq!(user_id_from_cookie("a.!!!not-base64!!!.c"), None);
        let cookie = cookie_for(r#"{"aud":"roost"}"#);
        assert_eq!(user_id_from_cookie(&cookie), None);
    }

    #[test]
    fn session_from_cookie_keeps_the_token() {
        let cookie = cookie_for(r#"{"sub":"user-3"}"#);
        let session = Session::from_cookie(&cookie, Some("bearer-xyz".into()));
        assert!(session.is_signed_in());
        assert_eq!(session.user_id(), Some("user-3"));
        assert_eq!(session.token(), Some("bearer-xyz"));

        let anonymous = Session::from_cookie("garbage", None);
        assert!(!anonymous.is_signed_in());
        assert_eq!(anonymous.token(), None);
    }
}
