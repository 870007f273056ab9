//! JSON REST API for tixgate.
//!
//! Exposes an axum [`Router`] backed by any [`tixgate_core::store::TicketStore`].
//! Authentication, TLS and transport concerns are the caller's
//! responsibility: the embedding server must insert a [`Caller`] into each
//! request's extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tixgate_api::api_router(store.clone()))
//! ```

pub mod caller;
pub mod error;
pub mod events;
pub mod tickets;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tixgate_core::store::TicketStore;

pub use caller::Caller;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TicketStore + 'static,
{
  Router::new()
    // Door
    .route("/events/{event_id}/verify", post(events::verify::<S>))
    .route("/events/{event_id}/attendees", get(events::attendees::<S>))
    .route("/events/{event_id}/summary", get(events::summary::<S>))
    // Tickets
    .route("/tickets", post(tickets::issue::<S>))
    .route("/history", get(tickets::history::<S>))
    .with_state(store)
}
