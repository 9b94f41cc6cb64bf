//! JSON REST API for Mission Control.
//!
//! Exposes an axum [`Router`] backed by a [`MissionControl`] over any store
//! backend. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", mctl_api::api_router(control.clone()))
//! ```

pub mod error;
pub mod feeds;
pub mod log;
pub mod sessions;
pub mod video;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use mctl_core::{
  control::MissionControl,
  store::{LaunchCatalogue, SessionStore},
};

pub use error::ApiError;

/// A store backend the API can serve from.
pub trait Backend: SessionStore + LaunchCatalogue + Send + Sync + 'static {}

impl<T> Backend for T where T: SessionStore + LaunchCatalogue + Send + Sync + 'static {}

/// Handler state: the shared coordinator.
pub type Control<S> = Arc<MissionControl<S>>;

/// Build a fully-materialised API router for `control`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Backend>(control: Control<S>) -> Router<()> {
  Router::new()
    // Session lifecycle
    .route("/active-session", get(sessions::active::<S>))
    .route("/session", post(sessions::create::<S>).put(sessions::update::<S>))
    .route("/session/{session_id}", delete(sessions::delete::<S>))
    // Update log and aggregates
    .route("/updates", post(log::add_update::<S>))
    .route("/updates/{session_id}", get(log::list_updates::<S>))
    .route("/milestones", post(log::add_milestone::<S>))
    // `GET` takes a session id, `PUT` a milestone id.
    .route(
      "/milestones/{id}",
      get(log::list_milestones::<S>).put(log::set_milestone_status::<S>),
    )
    .route("/weather", post(log::add_weather::<S>))
    .route("/weather/{session_id}", get(log::latest_weather::<S>))
    .route("/objectives", post(log::add_objective::<S>))
    .route("/objectives/{session_id}", get(log::list_objectives::<S>))
    // Video
    .route("/video-overlay", post(video::set_overlay::<S>))
    .route("/video-overlay/{session_id}", get(video::get_overlay::<S>))
    .route("/video-override", post(video::set_override::<S>))
    .route("/video-override/{session_id}", get(video::get_override::<S>))
    // Feed catalogue
    .route("/iss-feed/current", get(feeds::current::<S>))
    .route("/iss-feed/feeds", get(feeds::list_feeds::<S>).post(feeds::add_feed::<S>))
    .route("/iss-feed/schedule", post(feeds::add_schedule::<S>))
    .route("/iss-feed/schedules", get(feeds::list_schedules::<S>))
    .route("/iss-feed/schedules/{launch_id}/switch", post(feeds::switch::<S>))
    .with_state(control)
}

#[cfg(test)]
mod tests;
