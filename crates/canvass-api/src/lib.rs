//! JSON REST API for canvass.
//!
//! Exposes an axum [`Router`] backed by any [`canvass_core::store::RosterStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility, with one
//! exception: confirmation dispatch checks campaign membership here, at the
//! HTTP boundary, so the store never has to.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", canvass_api::api_router(store.clone(), SearchEngine::default()))
//! ```

pub mod campaigns;
pub mod confirmations;
pub mod error;
pub mod search;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use canvass_core::{search::SearchEngine, store::RosterStore};

pub use error::ApiError;

/// Shared handler state: the store plus one ranking engine carrying the
/// configured weights.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub engine: Arc<SearchEngine>,
}

// Manual impl: `S` itself is behind an `Arc` and need not be `Clone`.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), engine: self.engine.clone() }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, engine: SearchEngine) -> Router<()>
where
  S: RosterStore + 'static,
{
  let state = ApiState { store, engine: Arc::new(engine) };
  Router::new()
    .route("/search", get(search::handler::<S>))
    .route("/confirmations", post(confirmations::dispatch::<S>))
    .route("/campaigns/{id}", get(campaigns::progress::<S>))
    .with_state(state)
}
