//! Comment and like domain flows for the commenting platform client.
//!
//! Everything here sits on top of [`roost_graphql`]: typed operation
//! contracts for the platform schema, the like-toggle action, live like
//! events over the subscription transport, and composer draft autosave.
//! The embedding UI supplies the [`Notifier`] and [`SignInPrompt`] seams;
//! nothing in this crate renders anything.

pub mod drafts;
pub mod live;
pub mod notify;
pub mod operations;
pub mod toggle;

pub use drafts::{Draft, DraftStore};
pub use live::{LikeEvent, LikeEventKind, LikeEventStream, subscribe_like_events};
pub use notify::{Notifier, SignInPrompt, Toast, ToastKind};
pub use operations::{
    CurrentUser, DeleteLikePayload, InsertLikePayload, LikeRef, UserPayload, compound_id,
    delete_like_by_pk, insert_one_like, user_by_pk,
};
pub use toggle::{ClientLikeMutations, LikeMutations, LikeToggle};
