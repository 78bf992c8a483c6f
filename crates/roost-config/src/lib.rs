#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Environment-derived settings for roost embedders.
//!
//! Layout: `model.rs` (typed settings and the execution context),
//! `loader.rs` (environment resolution and the anonymous credential),
//! `defaults.rs` (well-known names and paths).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use defaults::{DEFAULT_APP_NAME, GRAPHQL_PATH};
pub use error::{ConfigError, ConfigResult};
pub use loader::anonymous_token;
pub use model::{Endpoints, ExecutionContext, Settings};
