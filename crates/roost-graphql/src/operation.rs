//! Tagged operations and the wire envelope.
//!
//! Every defined operation carries its kind as an explicit attribute, set
//! where the operation is defined. Transport routing reads the tag; the
//! client never inspects the document text to classify an operation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphqlError, GraphqlResult};

/// Capability tag deciding which transport carries an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read over the per-request transport.
    Query,
    /// Write over the per-request transport.
    Mutation,
    /// Server-push stream over the duplex transport.
    Subscription,
}

/// A defined GraphQL operation plus its variables for one issue.
#[derive(Debug, Clone)]
pub struct Operation {
    name: &'static str,
    document: &'static str,
    kind: OperationKind,
    variables: Value,
}

impl Operation {
    /// Define a query operation.
    #[must_use]
    pub fn query(name: &'static str, document: &'static str, variables: Value) -> Self {
        Self {
            name,
            document,
            kind: OperationKind::Query,
            variables,
        }
    }

    /// Define a mutation operation.
    #[must_use]
    pub fn mutation(name: &'static str, document: &'static str, variables: Value) -> Self {
        Self {
            name,
            document,
            kind: OperationKind::Mutation,
            variables,
        }
    }

    /// Define a subscription operation.
    #[must_use]
    pub fn subscription(name: &'static str, document: &'static str, variables: Value) -> Self {
        Self {
            name,
            document,
            kind: OperationKind::Subscription,
            variables,
        }
    }

    /// Operation name as declared in the document.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The capability tag.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Build the wire request for this operation.
    #[must_use]
    pub fn request(&self) -> OperationRequest {
        OperationRequest {
            query: self.document.to_string(),
            operation_name: self.name.to_string(),
            variables: self.variables.clone(),
        }
    }
}

/// Serialized request body shared by both transports.
#[derive(Debug, Clone, Serialize)]
pub struct OperationRequest {
    /// Operation document text.
    pub query: String,
    /// Name selecting the operation within the document.
    #[serde(rename = "operationName")]
    pub operation_name: String,
    /// Operation variables.
    pub variables: Value,
}

/// Response envelope shared by both transports.
#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse {
    /// Payload under `data`, absent when the operation failed outright.
    pub data: Option<Value>,
    /// Errors reported by the server.
    #[serde(default)]
    pub errors: Vec<WireError>,
}

impl WireResponse {
    /// Reduce the envelope to its data payload.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::Rejected`] when the server reported errors
    /// and [`GraphqlError::MissingData`] when it reported nothing at all.
    pub fn into_data(self, operation_name: &'static str) -> GraphqlResult<Value> {
        if !self.errors.is_empty() {
            return Err(GraphqlError::Rejected {
                operation_name,
                errors: self.errors,
            });
        }
        self.data
            .ok_or(GraphqlError::MissingData { operation_name })
    }
}

/// One server-side error as returned on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    /// Human-readable message.
    pub message: String,
    /// Server-specific extension payload (error codes and the like).
    #[serde(default)]
    pub extensions: Option<Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn requests_serialize_with_the_declared_name() {
        let operation = Operation::mutation(
            "insertOneLike",
            "mutation insertOneLike($commentId: uuid!) { … }",
            json!({"commentId": "c1"}),
        );
        assert_eq!(operation.kind(), OperationKind::Mutation);

        let body = serde_json::to_value(operation.request()).expect("serializes");
        assert_eq!(body["operationName"], json!("insertOneLike"));
        assert_eq!(body["variables"]["commentId"], json!("c1"));
        assert!(body["query"].as_str().expect("query").starts_with("mutation"));
    }

    #[test]
    fn into_data_prefers_errors_over_data() {
        let response: WireResponse = serde_json::from_value(json!({
            "data": {"ok": true},
            "errors": [{"message": "boom"}],
        }))
        .expect("parses");
        let err = response.into_data("op").expect_err("errors win");
        match err {
            GraphqlError::Rejected {
                operation_name,
                errors,
            } => {
                assert_eq!(operation_name, "op");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn into_data_requires_a_payload() {
        let response: WireResponse = serde_json::from_value(json!({})).expect("parses");
        assert!(matches!(
            response.into_data("op"),
            Err(GraphqlError::MissingData {
                operation_name: "op"
            })
        ));

        let response: WireResponse =
            serde_json::from_value(json!({"data": {"id": "x"}})).expect("parses");
        assert_eq!(response.into_data("op").expect("data"), json!({"id": "x"}));
    }
}
