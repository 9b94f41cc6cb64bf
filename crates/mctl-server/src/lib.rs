//! HTTP server for Mission Control.
//!
//! Mounts the JSON API under `/api`, guards mutations with operator auth
//! when credentials are configured, and traces every request.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use chrono::Duration;
use mctl_api::{Backend, Control};
use mctl_core::{
  control::ControlConfig,
  feed::{FALLBACK_ISS_EMBED_URL, NewFeed},
  resolve::{DEFAULT_LAUNCH_GRACE_MINUTES, MAX_LAUNCH_GRACE_MINUTES},
  session::DEFAULT_SESSION_TTL_HOURS,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use auth::{AuthConfig, require_operator};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MCTL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  #[serde(default = "default_ttl_hours")]
  pub session_ttl_hours:    i64,
  #[serde(default = "default_grace_minutes")]
  pub launch_grace_minutes: i64,
  #[serde(default)]
  pub admin_username:       Option<String>,
  #[serde(default)]
  pub admin_password_hash:  Option<String>,
  /// Insert the built-in ISS feed when the catalogue is empty.
  #[serde(default = "default_true")]
  pub seed_iss_feed:        bool,
}

/// One year.
const MAX_SESSION_TTL_HOURS: i64 = 365 * 24;

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("mission-control.db") }
fn default_ttl_hours() -> i64 { DEFAULT_SESSION_TTL_HOURS }
fn default_grace_minutes() -> i64 { DEFAULT_LAUNCH_GRACE_MINUTES }
fn default_true() -> bool { true }

impl ServerConfig {
  pub fn control_config(&self) -> Result<ControlConfig, Error> {
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
      return Err(Error::Config(format!(
        "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}"
      )));
    }
    if !(0..=MAX_LAUNCH_GRACE_MINUTES).contains(&self.launch_grace_minutes) {
      return Err(Error::Config(format!(
        "launch_grace_minutes must be between 0 and {MAX_LAUNCH_GRACE_MINUTES}"
      )));
    }
    Ok(ControlConfig {
      session_ttl:  Duration::hours(self.session_ttl_hours),
      launch_grace: Duration::minutes(self.launch_grace_minutes),
    })
  }

  /// Operator credentials, if configured. Setting only one of the two
  /// fields is an error.
  pub fn auth(&self) -> Result<Option<AuthConfig>, Error> {
    match (&self.admin_username, &self.admin_password_hash) {
      (Some(username), Some(password_hash)) => Ok(Some(AuthConfig {
        username:      username.clone(),
        password_hash: password_hash.clone(),
      })),
      (None, None) => Ok(None),
      _ => Err(Error::Config(
        "admin_username and admin_password_hash must be set together".into(),
      )),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server [`Router`]: API under `/api`, a `/health` probe, operator
/// auth on mutations and request tracing.
pub fn router<S: Backend>(control: Control<S>, auth: Option<AuthConfig>) -> Router {
  Router::new()
    .nest("/api", mctl_api::api_router(control))
    .route("/health", get(|| async { "ok" }))
    .layer(middleware::from_fn_with_state(auth.map(Arc::new), require_operator))
    .layer(TraceLayer::new_for_http())
}

/// Insert the built-in ISS feed as the catalogue default when no feed exists.
pub async fn seed_catalogue<S: Backend>(control: &Control<S>) -> Result<(), mctl_core::Error> {
  if !control.feeds().await?.is_empty() {
    return Ok(());
  }
  let feed = control
    .add_feed(NewFeed {
      title:       "ISS Live".to_string(),
      youtube_url: None,
      embed_url:   FALLBACK_ISS_EMBED_URL.to_string(),
      is_active:   true,
      is_default:  true,
      priority:    0,
    })
    .await?;
  info!(feed_id = %feed.feed_id, "seeded default ISS feed");
  Ok(())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use mctl_core::{control::MissionControl, feed::NewSchedule};
  use mctl_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn control() -> Control<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    Arc::new(MissionControl::new(store, ControlConfig::default()))
  }

  async fn app(password: Option<&str>) -> Router {
    let auth = password.map(|p| AuthConfig {
      username:      "flight".to_string(),
      password_hash: auth::hash_password(p).unwrap(),
    });
    router(control().await, auth)
  }

  fn create_request(credentials: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder()
      .method("POST")
      .uri("/api/session")
      .header(header::CONTENT_TYPE, "application/json");
    if let Some((user, pass)) = credentials {
      builder = builder.header(
        header::AUTHORIZATION,
        format!("Basic {}", B64.encode(format!("{user}:{pass}"))),
      );
    }
    let body = serde_json::json!({
      "missionId": "iss-live",
      "missionName": "ISS Live",
      "launchDate": "2026-11-01T09:00:00Z",
      "status": "live",
    });
    builder.body(Body::from(body.to_string())).unwrap()
  }

  fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  #[tokio::test]
  async fn health_is_ok() {
    let resp = app(Some("secret")).await.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn reads_are_anonymous() {
    let resp = app(Some("secret"))
      .await
      .oneshot(get("/api/active-session"))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn mutation_without_credentials_is_401() {
    let resp = app(Some("secret"))
      .await
      .oneshot(create_request(None))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn mutation_with_wrong_password_is_401() {
    let resp = app(Some("secret"))
      .await
      .oneshot(create_request(Some(("flight", "guess"))))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn mutation_with_credentials_succeeds() {
    let resp = app(Some("secret"))
      .await
      .oneshot(create_request(Some(("flight", "secret"))))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  #[tokio::test]
  async fn open_server_accepts_mutations() {
    let resp = app(None).await.oneshot(create_request(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  #[tokio::test]
  async fn anonymous_viewer_persists_feed_switch() {
    let control = control().await;
    control
      .add_schedule(NewSchedule {
        launch_id:           "ll2-1".into(),
        launch_name:         "Crew-12".into(),
        launch_date:         chrono::Utc::now() + Duration::minutes(20),
        feed_url:            Some("https://example.com/crew-12".into()),
        feed_id:             None,
        switch_time_minutes: 30,
      })
      .await
      .unwrap();
    let auth = AuthConfig {
      username:      "flight".to_string(),
      password_hash: auth::hash_password("secret").unwrap(),
    };
    let app = router(control.clone(), Some(auth));

    let switch = || {
      Request::builder()
        .method("POST")
        .uri("/api/iss-feed/schedules/ll2-1/switch")
        .body(Body::empty())
        .unwrap()
    };
    let resp = app.clone().oneshot(switch()).await.unwrap();
    assert!(resp.status().is_success());
    assert!(control.schedules().await.unwrap()[0].is_switched);

    // Repeating it is harmless.
    let resp = app.clone().oneshot(switch()).await.unwrap();
    assert!(resp.status().is_success());

    // Other catalogue writes still need an operator.
    let resp = app
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/api/iss-feed/schedule")
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from(
            serde_json::json!({
              "launchId": "ll2-2",
              "launchName": "Other",
              "launchDate": "2026-11-01T09:00:00Z",
              "switchTimeMinutes": 30,
            })
            .to_string(),
          ))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn seed_catalogue_runs_once() {
    let control = control().await;
    seed_catalogue(&control).await.unwrap();
    seed_catalogue(&control).await.unwrap();
    let feeds = control.feeds().await.unwrap();
    assert_eq!(feeds.len(), 1);
    assert!(feeds[0].is_default);
  }

  #[test]
  fn half_configured_auth_is_rejected() {
    let cfg = ServerConfig {
      host:                 default_host(),
      port:                 default_port(),
      store_path:           default_store_path(),
      session_ttl_hours:    24,
      launch_grace_minutes: 60,
      admin_username:       Some("flight".into()),
      admin_password_hash:  None,
      seed_iss_feed:        true,
    };
    assert!(matches!(cfg.auth(), Err(Error::Config(_))));
    assert_eq!(cfg.control_config().unwrap().session_ttl, Duration::hours(24));

    let huge = ServerConfig { launch_grace_minutes: i64::MAX, ..cfg };
    assert!(matches!(huge.control_config(), Err(Error::Config(_))));
  }
}
