//! Typed operation contracts against the platform schema.
//!
//! Response shapes mirror the wire field names (camelCase); the documents
//! are written against the platform's Hasura-generated schema.

use serde::Deserialize;
use serde_json::json;

use roost_graphql::Operation;

const DELETE_LIKE_DOCUMENT: &str = "\
mutation deleteLikeByPk($id: uuid!) {
  deleteLikeByPk(id: $id) {
    id
  }
}";

const INSERT_LIKE_DOCUMENT: &str = "\
mutation insertOneLike($commentId: uuid!, $compoundId: String!) {
  insertOneLike(object: { commentId: $commentId, compoundId: $compoundId }) {
    id
  }
}";

const USER_BY_PK_DOCUMENT: &str = "\
query userByPk($id: uuid!) {
  userByPk(id: $id) {
    id
    displayName
  }
}";

pub(crate) const LIKE_EVENTS_DOCUMENT: &str = "\
subscription commentLikeEvents($commentId: uuid!) {
  commentLikeEvents(commentId: $commentId) {
    likeId
    commentId
    userId
    kind
  }
}";

/// The composite key enforcing one like per (user, comment) pair.
#[must_use]
pub fn compound_id(user_id: &str, comment_id: &str) -> String {
    format!("{user_id}:{comment_id}")
}

/// Delete a like by its identifier.
#[must_use]
pub fn delete_like_by_pk(like_id: &str) -> Operation {
    Operation::mutation(
        "deleteLikeByPk",
        DELETE_LIKE_DOCUMENT,
        json!({"id": like_id}),
    )
}

/// Create a like for (current user, comment).
///
/// The server derives the user from the bearer credential; the compound id
/// carries the uniqueness constraint.
#[must_use]
pub fn insert_one_like(comment_id: &str, compound_id: &str) -> Operation {
    Operation::mutation(
        "insertOneLike",
        INSERT_LIKE_DOCUMENT,
        json!({"commentId": comment_id, "compoundId": compound_id}),
    )
}

/// Resolve the signed-in user's profile.
///
/// Always issued against the network; profile freshness beats the cache
/// here, so callers must not serve this from a cached entry.
#[must_use]
pub fn user_by_pk(user_id: &str) -> Operation {
    Operation::query("userByPk", USER_BY_PK_DOCUMENT, json!({"id": user_id}))
}

/// A like as referenced in mutation responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LikeRef {
    /// Identifier of the like record.
    pub id: String,
}

/// Response shape of [`delete_like_by_pk`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLikePayload {
    /// The deleted like, `null` when nothing matched the identifier.
    pub delete_like_by_pk: Option<LikeRef>,
}

/// Response shape of [`insert_one_like`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertLikePayload {
    /// The created like, `null` when the server answered without one.
    pub insert_one_like: Option<LikeRef>,
}

/// A user profile as returned by [`user_by_pk`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// User identifier.
    pub id: String,
    /// Name shown next to comments.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Response shape of [`user_by_pk`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    /// The profile, `null` for an unknown id.
    pub user_by_pk: Option<CurrentUser>,
}
