//! The like-toggle action.
//!
//! Two states (`liked`/`unliked`), toggled by explicit user intent. The
//! action never rejects: every failure is reduced to a diagnostic log and,
//! on the create path only, a transient-failure toast. Callers wanting
//! at-most-one-in-flight semantics debounce on their side; two rapid
//! toggles can race and one create will then trip the (userId, commentId)
//! uniqueness constraint, which is reported like any other create failure.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use roost_graphql::{Client, GraphqlResult};
use roost_session::Session;

use crate::notify::{Notifier, SignInPrompt, Toast};
use crate::operations::{
    DeleteLikePayload, InsertLikePayload, compound_id, delete_like_by_pk, insert_one_like,
};

/// Message shown when a like fails to land.
pub(crate) const TRANSIENT_FAILURE_MESSAGE: &str =
    "Server didn't respond, please try again later.";

/// The two like mutations, as a seam so the action is testable without a
/// network.
#[async_trait]
pub trait LikeMutations: Send + Sync {
    /// Delete a like by identifier.
    async fn delete_like(&self, like_id: &str) -> GraphqlResult<DeleteLikePayload>;
    /// Create a like for (comment, compound id).
    async fn insert_like(
        &self,
        comment_id: &str,
        compound_id: &str,
    ) -> GraphqlResult<InsertLikePayload>;
}

/// Production [`LikeMutations`] issuing the contracts through the client.
pub struct ClientLikeMutations {
    client: Arc<Client>,
}

impl ClientLikeMutations {
    /// Wrap a client produced by the factory.
    #[must_use]
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LikeMutations for ClientLikeMutations {
    async fn delete_like(&self, like_id: &str) -> GraphqlResult<DeleteLikePayload> {
        self.client.execute_as(&delete_like_by_pk(like_id)).await
    }

    async fn insert_like(
        &self,
        comment_id: &str,
        compound_id: &str,
    ) -> GraphqlResult<InsertLikePayload> {
        self.client
            .execute_as(&insert_one_like(comment_id, compound_id))
            .await
    }
}

/// Toggles a viewer's like on a comment.
pub struct LikeToggle {
    session: Session,
    mutations: Arc<dyn LikeMutations>,
    notifier: Arc<dyn Notifier>,
    sign_in: Arc<dyn SignInPrompt>,
}

impl LikeToggle {
    /// Build the action for the current session.
    ///
    /// The session is captured at construction; embedders rebuild the
    /// action when the viewer signs in or out, the same way the factory
    /// rebuilds the client on a token change.
    #[must_use]
    pub fn new(
        session: Session,
        mutations: Arc<dyn LikeMutations>,
        notifier: Arc<dyn Notifier>,
        sign_in: Arc<dyn SignInPrompt>,
    ) -> Self {
        Self {
            session,
            mutations,
            notifier,
            sign_in,
        }
    }

    /// Flip the like state for `comment_id`.
    ///
    /// `is_liked` is the state the caller is currently showing; `like_id`
    /// identifies the existing like when it is set. Callers never pre-check
    /// anything else: a signed-out viewer is redirected to sign-in, and
    /// every failure resolves normally after its diagnostic/notification
    /// side effects.
    pub async fn toggle(&self, is_liked: bool, like_id: &str, comment_id: &str) {
        let Some(user_id) = self.session.user_id() else {
            self.sign_in.request_sign_in();
            return;
        };
        if is_liked {
            self.unlike(like_id).await;
        } else {
            self.like(user_id, comment_id).await;
        }
    }

    async fn unlike(&self, like_id: &str) {
        match self.mutations.delete_like(like_id).await {
            Ok(payload) if payload.delete_like_by_pk.is_some() => {}
            // The record was already gone; the next refetch reconciles the
            // UI, nothing to show the user.
            Ok(_) => error!(like_id, "like deletion returned no identifier"),
            Err(error) => error!(like_id, %error, "failed to delete like"),
        }
    }

    async fn like(&self, user_id: &str, comment_id: &str) {
        let compound = compound_id(user_id, comment_id);
        match self.mutations.insert_like(comment_id, &compound).await {
            Ok(payload) if payload.insert_one_like.is_some() => {}
            Ok(_) => {
                self.notifier.notify(Toast::error(TRANSIENT_FAILURE_MESSAGE));
                error!(comment_id, "like creation returned no identifier");
            }
            Err(error) => {
                // A duplicate create racing an in-flight click lands here
                // too, indistinguishable from any other rejection.
                self.notifier.notify(Toast::error(TRANSIENT_FAILURE_MESSAGE));
                error!(comment_id, %error, "failed to create like");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use roost_graphql::{GraphqlError, WireError};

    use crate::notify::ToastKind;
    use crate::operations::LikeRef;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        toasts: Mutex<Vec<Toast>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, toast: Toast) {
            self.toasts.lock().expect("toast mutex").push(toast);
        }
    }

    impl RecordingNotifier {
        fn toasts(&self) -> Vec<Toast> {
            self.toasts.lock().expect("toast mutex").clone()
        }
    }

    #[derive(Default)]
    struct RecordingSignIn {
        prompts: AtomicUsize,
    }

    impl SignInPrompt for RecordingSignIn {
        fn request_sign_in(&self) {
            self.prompts.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Scripted backend: deletes answer from `delete_ids`, inserts answer
    /// from `insert_ids`, in call order; `None` scripts a rejection.
    #[derive(Default)]
    struct ScriptedMutations {
        delete_ids: Vec<Option<String>>,
        insert_ids: Vec<Option<String>>,
        delete_calls: AtomicUsize,
        insert_calls: AtomicUsize,
        last_compound: Mutex<Option<String>>,
    }

    fn uniqueness_violation(operation_name: &'static str) -> GraphqlError {
        GraphqlError::Rejected {
            operation_name,
            errors: vec![WireError {
                message: "Unique constraint failed on the fields: (`userId`,`commentId`)"
                    .to_string(),
                extensions: None,
            }],
        }
    }

    #[async_trait]
    impl LikeMutations for ScriptedMutations {
        async fn delete_like(&self, _like_id: &str) -> GraphqlResult<DeleteLikePayload> {
            let call = self.delete_calls.fetch_add(1, Ordering::SeqCst);
            match self.delete_ids.get(call) {
                Some(Some(id)) => Ok(DeleteLikePayload {
                    delete_like_by_pk: Some(LikeRef { id: id.clone() }),
                }),
                Some(None) | None => Ok(DeleteLikePayload {
                    delete_like_by_pk: None,
                }),
            }
        }

        async fn insert_like(
            &self,
            _comment_id: &str,
            compound_id: &str,
        ) -> GraphqlResult<InsertLikePayload> {
            let call = self.insert_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_compound.lock().expect("compound mutex") = Some(compound_id.to_string());
            match self.insert_ids.get(call) {
                Some(Some(id)) => Ok(InsertLikePayload {
                    insert_one_like: Some(LikeRef { id: id.clone() }),
                }),
                Some(None) | None => Err(uniqueness_violation("insertOneLike")),
            }
        }
    }

    struct Fixture {
        toggle: LikeToggle,
        mutations: Arc<ScriptedMutations>,
        notifier: Arc<RecordingNotifier>,
        sign_in: Arc<RecordingSignIn>,
    }

    fn fixture(session: Session, mutations: ScriptedMutations) -> Fixture {
        let mutations = Arc::new(mutations);
        let notifier = Arc::new(RecordingNotifier::default());
        let sign_in = Arc::new(RecordingSignIn::default());
        let toggle = LikeToggle::new(
            session,
            Arc::clone(&mutations) as Arc<dyn LikeMutations>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&sign_in) as Arc<dyn SignInPrompt>,
        );
        Fixture {
            toggle,
            mutations,
            notifier,
            sign_in,
        }
    }

    fn signed_in() -> Session {
        Session::signed_in("u1", "bearer-t1")
    }

    #[tokio::test]
    async fn signed_out_viewers_are_sent_to_sign_in() {
        let fx = fixture(Session::anonymous(), ScriptedMutations::default());

        fx.toggle.toggle(false, "", "c1").await;

        assert_eq!(fx.sign_in.prompts.load(Ordering::SeqCst), 1);
        assert_eq!(fx.mutations.insert_calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.mutations.delete_calls.load(Ordering::SeqCst), 0);
        assert!(fx.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn unlike_ignores_an_already_deleted_record() {
        let fx = fixture(
            signed_in(),
            ScriptedMutations {
                delete_ids: vec![None],
                ..ScriptedMutations::default()
            },
        );

        fx.toggle.toggle(true, "l1", "c1").await;

        assert_eq!(fx.mutations.delete_calls.load(Ordering::SeqCst), 1);
        // Silent to the user; reconciliation happens on the next refetch.
        assert!(fx.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn like_success_is_silent() {
        let fx = fixture(
            signed_in(),
            ScriptedMutations {
                insert_ids: vec![Some("l2".to_string())],
                ..ScriptedMutations::default()
            },
        );

        fx.toggle.toggle(false, "", "c1").await;

        assert!(fx.notifier.toasts().is_empty());
        assert_eq!(
            fx.mutations
                .last_compound
                .lock()
                .expect("compound mutex")
                .as_deref(),
            Some("u1:c1")
        );
    }

    #[tokio::test]
    async fn like_rejection_toasts_once_and_resolves() {
        let fx = fixture(signed_in(), ScriptedMutations::default());

        fx.toggle.toggle(false, "", "c1").await;

        let toasts = fx.notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);
        assert_eq!(toasts[0].message, TRANSIENT_FAILURE_MESSAGE);
        assert_eq!(fx.sign_in.prompts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn double_click_race_resolves_both_and_toasts_at_least_once() {
        // First create lands, the racing duplicate trips the uniqueness
        // constraint.
        let fx = fixture(
            signed_in(),
            ScriptedMutations {
                insert_ids: vec![Some("l2".to_string()), None],
                ..ScriptedMutations::default()
            },
        );

        tokio::join!(
            fx.toggle.toggle(false, "", "c1"),
            fx.toggle.toggle(false, "", "c1"),
        );

        assert_eq!(fx.mutations.insert_calls.load(Ordering::SeqCst), 2);
        let toasts = fx.notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Error);
    }
}
