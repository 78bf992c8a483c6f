//! Session-bound GraphQL client for the commenting platform.
//!
//! The factory produces one client per bearer token, recreating the client
//! (never the cache) when the token changes. Operations carry an explicit
//! capability tag: queries and mutations go out per-request over HTTP,
//! subscriptions ride a lazy, auto-reconnecting duplex socket speaking
//! `graphql-transport-ws`. In a server execution context no socket is
//! constructed at all.
//!
//! Layout: `operation.rs` (tagged operations and the wire envelope),
//! `http.rs` / `socket.rs` (the two transports), `client.rs` (per-token
//! client), `factory.rs` (token-keyed construction and cache reuse).

pub mod client;
pub mod error;
pub mod factory;
pub mod http;
pub mod operation;
pub mod socket;

pub use client::Client;
pub use error::{GraphqlError, GraphqlResult};
pub use factory::ClientFactory;
pub use http::HttpTransport;
pub use operation::{Operation, OperationKind, OperationRequest, WireError, WireResponse};
pub use socket::{SocketTransport, SubscriptionStream};
