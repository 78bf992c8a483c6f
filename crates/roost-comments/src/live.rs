//! Live like events over the duplex transport.

use serde::Deserialize;
use serde_json::json;

use roost_graphql::{Client, GraphqlError, GraphqlResult, Operation, SubscriptionStream};

use crate::operations::LIKE_EVENTS_DOCUMENT;

/// What happened to a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeEventKind {
    /// A like came into existence.
    Added,
    /// A like was withdrawn.
    Removed,
}

/// One like change on the watched comment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeEvent {
    /// Identifier of the like record.
    pub like_id: String,
    /// Comment the like belongs to.
    pub comment_id: String,
    /// User who toggled.
    pub user_id: String,
    /// Added or removed.
    pub kind: LikeEventKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikeEventEnvelope {
    comment_like_events: LikeEvent,
}

/// Typed stream of [`LikeEvent`]s for one comment.
pub struct LikeEventStream {
    inner: SubscriptionStream,
}

impl LikeEventStream {
    /// Receive the next event, `None` once the server completes the
    /// subscription.
    pub async fn next(&mut self) -> Option<GraphqlResult<LikeEvent>> {
        let data = match self.inner.next().await? {
            Ok(data) => data,
            Err(error) => return Some(Err(error)),
        };
        let decoded = serde_json::from_value::<LikeEventEnvelope>(data)
            .map(|envelope| envelope.comment_like_events)
            .map_err(|source| GraphqlError::Decode {
                operation_name: "commentLikeEvents",
                source,
            });
        Some(decoded)
    }
}

/// Watch like changes on `comment_id`.
///
/// # Errors
///
/// Returns an error when subscriptions are unavailable in the client's
/// execution context or the socket driver is gone.
pub fn subscribe_like_events(
    client: &Client,
    comment_id: &str,
) -> GraphqlResult<LikeEventStream> {
    let operation = Operation::subscription(
        "commentLikeEvents",
        LIKE_EVENTS_DOCUMENT,
        json!({"commentId": comment_id}),
    );
    let inner = client.subscribe(&operation)?;
    Ok(LikeEventStream { inner })
}
