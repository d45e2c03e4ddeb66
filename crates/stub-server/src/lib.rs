//! # Care Plan Stub Server
//!
//! In-memory implementation of the care plan HTTP API.
//!
//! Handles:
//! - every create/read endpoint the authoring workflow calls, with the `{ success, data }` envelope
//! - bearer-token checking, parent-existence checks and title validation
//! - an OpenAPI document at `/api-docs/openapi.json`
//!
//! The store exposes seeding and one-shot failure injection so tests can drive partial-failure
//! scenarios against a real HTTP stack.

#![warn(rust_2018_idioms)]

pub mod routes;
pub mod store;

pub use routes::router;
pub use store::{StubFailure, StubStore, DEFAULT_PER_PAGE};

use std::net::SocketAddr;

/// Errors raised while handling stub requests or loading seed data.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Injected(String),
    #[error("{0}")]
    Rejected(String),
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("server error without a body")]
    Bare,
    #[error("internal error: {0}")]
    Internal(String),
    #[error("seed error: {0}")]
    Seed(String),
}

/// Type alias for Results that can fail with a [`StubError`].
pub type StubResult<T> = Result<T, StubError>;

/// Binds the stub API to an ephemeral port on 127.0.0.1 and serves it in the background.
///
/// Returns the bound address. The server runs until the Tokio runtime shuts down.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot be bound.
pub async fn spawn(store: StubStore) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(store);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("stub server stopped: {e}");
        }
    });

    Ok(addr)
}
