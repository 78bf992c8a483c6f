//! Error types for client operations.

use thiserror::Error;

use crate::operation::{OperationKind, WireError};

/// Primary error type for issuing operations through the client.
#[derive(Debug, Error)]
pub enum GraphqlError {
    /// The HTTP request itself failed (connect, TLS, body).
    #[error("request transport failed")]
    Transport {
        /// Operation the request carried.
        operation_name: &'static str,
        /// Source transport error.
        source: reqwest::Error,
    },
    /// The server answered with GraphQL errors.
    #[error("server rejected the operation")]
    Rejected {
        /// Operation the server rejected.
        operation_name: &'static str,
        /// Errors as returned on the wire.
        errors: Vec<WireError>,
    },
    /// The response carried neither data nor errors.
    #[error("response carried no data")]
    MissingData {
        /// Operation whose response was empty.
        operation_name: &'static str,
    },
    /// The response data did not match the expected shape.
    #[error("response payload failed to decode")]
    Decode {
        /// Operation whose payload failed to decode.
        operation_name: &'static str,
        /// Source decode error.
        source: serde_json::Error,
    },
    /// `execute` was called with an operation that needs the socket.
    #[error("operation is not executable over the request transport")]
    NotExecutable {
        /// Operation that was misrouted.
        operation_name: &'static str,
        /// Its capability tag.
        kind: OperationKind,
    },
    /// `subscribe` was called with a non-subscription operation.
    #[error("operation is not a subscription")]
    NotSubscribable {
        /// Operation that was misrouted.
        operation_name: &'static str,
        /// Its capability tag.
        kind: OperationKind,
    },
    /// Subscriptions are not available in this execution context.
    #[error("subscriptions are unavailable in a server context")]
    SubscriptionsUnavailable,
    /// The duplex socket failed outside any single operation.
    #[error("socket transport failed")]
    Socket {
        /// Operation identifier.
        operation: &'static str,
        /// Human-readable failure detail.
        detail: String,
    },
}

/// Convenience alias for client results.
pub type GraphqlResult<T> = Result<T, GraphqlError>;
