//! Per-token client over both transports.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use roost_cache::Cache;
use roost_config::{Endpoints, ExecutionContext};

use crate::error::{GraphqlError, GraphqlResult};
use crate::http::HttpTransport;
use crate::operation::{Operation, OperationKind};
use crate::socket::{SocketTransport, SubscriptionStream};

/// A client bound to one bearer credential.
///
/// Clients are produced by [`crate::ClientFactory`] and replaced wholesale
/// when the credential changes; the cache handle they carry survives the
/// replacement. Construction itself cannot fail and opens no connection.
pub struct Client {
    http: HttpTransport,
    socket: Option<Arc<SocketTransport>>,
    cache: Cache,
}

impl Client {
    pub(crate) fn new(
        bearer: String,
        endpoints: &Endpoints,
        context: ExecutionContext,
        cache: Cache,
    ) -> Self {
        let socket = context.supports_socket().then(|| {
            Arc::new(SocketTransport::new(
                endpoints.socket().clone(),
                bearer.clone(),
            ))
        });
        Self {
            http: HttpTransport::new(endpoints.http().clone(), bearer),
            socket,
            cache,
        }
    }

    /// The bearer credential this client authenticates with.
    #[must_use]
    pub fn bearer(&self) -> &str {
        self.http.bearer()
    }

    /// Handle to the cache shared across client recreations.
    #[must_use]
    pub const fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Issue a query or mutation over the request transport.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::NotExecutable`] for subscription-tagged
    /// operations, otherwise whatever the transport or envelope reports.
    pub async fn execute(&self, operation: &Operation) -> GraphqlResult<Value> {
        if operation.kind() == OperationKind::Subscription {
            return Err(GraphqlError::NotExecutable {
                operation_name: operation.name(),
                kind: operation.kind(),
            });
        }
        self.http.execute(operation).await
    }

    /// Issue a query or mutation and decode its data payload.
    ///
    /// # Errors
    ///
    /// As [`Client::execute`], plus a decode error when the payload does
    /// not match `T`.
    pub async fn execute_as<T: DeserializeOwned>(&self, operation: &Operation) -> GraphqlResult<T> {
        let name = operation.name();
        let data = self.execute(operation).await?;
        serde_json::from_value(data).map_err(|source| GraphqlError::Decode {
            operation_name: name,
            source,
        })
    }

    /// Open a server-push stream for a subscription-tagged operation.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::NotSubscribable`] for request-tagged
    /// operations and [`GraphqlError::SubscriptionsUnavailable`] when the
    /// client was built for a server execution context.
    pub fn subscribe(&self, operation: &Operation) -> GraphqlResult<SubscriptionStream> {
        if operation.kind() != OperationKind::Subscription {
            return Err(GraphqlError::NotSubscribable {
                operation_name: operation.name(),
                kind: operation.kind(),
            });
        }
        let socket = self
            .socket
            .as_ref()
            .ok_or(GraphqlError::SubscriptionsUnavailable)?;
        socket.subscribe(operation)
    }
}
