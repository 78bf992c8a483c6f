//! Per-request HTTP transport for queries and mutations.

use reqwest::header::AUTHORIZATION;
use url::Url;

use crate::error::{GraphqlError, GraphqlResult};
use crate::operation::{Operation, WireResponse};

/// Stateless request transport; one POST per operation.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    bearer: String,
}

impl HttpTransport {
    /// Build a transport for `endpoint` authenticating as `bearer`.
    #[must_use]
    pub fn new(endpoint: Url, bearer: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            bearer: bearer.into(),
        }
    }

    /// The bearer credential attached to every request.
    #[must_use]
    pub fn bearer(&self) -> &str {
        &self.bearer
    }

    /// POST one operation and reduce the response envelope to its data.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the request fails to complete, and a
    /// rejection/missing-data error per the envelope contents.
    pub async fn execute(&self, operation: &Operation) -> GraphqlResult<serde_json::Value> {
        let name = operation.name();
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer))
            .json(&operation.request())
            .send()
            .await
            .map_err(|source| GraphqlError::Transport {
                operation_name: name,
                source,
            })?;
        let envelope: WireResponse =
            response
                .json()
                .await
                .map_err(|source| GraphqlError::Transport {
                    operation_name: name,
                    source,
                })?;
        envelope.into_data(name)
    }
}
