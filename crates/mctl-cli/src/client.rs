//! Async HTTP client wrapping the Mission Control JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use mctl_core::{
  feed::{CurrentFeed, IssLiveFeed, LaunchFeedSchedule, NewFeed, NewSchedule},
  log::{
    MilestoneStatus, MissionMilestone, MissionObjective, MissionUpdate, MissionWeather,
    NewMilestone, NewUpdate, NewWeather,
  },
  overlay::{OverlayKind, VideoOverlay, VideoOverride},
  session::{MissionSession, NewSession, SessionPatch},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

/// Connection settings for the Mission Control API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the Mission Control REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    let resp = self
      .auth(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    if resp.status().is_success() {
      return Ok(resp);
    }
    let status = resp.status();
    let message = resp
      .json::<Value>()
      .await
      .ok()
      .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
      .unwrap_or_else(|| status.to_string());
    Err(anyhow!("{what} → {status}: {message}"))
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let what = format!("GET {path}");
    self
      .send(self.client.get(self.url(path)), &what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {path}"))
  }

  async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
    let what = format!("POST {path}");
    self
      .send(self.client.post(self.url(path)).json(body), &what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {path}"))
  }

  async fn put<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
    let what = format!("PUT {path}");
    self
      .send(self.client.put(self.url(path)).json(body), &what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {path}"))
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  /// `GET /api/active-session`; a 404 means no session is active.
  pub async fn active_session(&self) -> Result<Option<MissionSession>> {
    let resp = self
      .auth(self.client.get(self.url("/active-session")))
      .send()
      .await
      .context("GET /active-session failed")?;
    match resp.status() {
      StatusCode::NOT_FOUND => Ok(None),
      s if s.is_success() => resp
        .json()
        .await
        .map(Some)
        .context("deserialising active session"),
      s => Err(anyhow!("GET /active-session → {s}")),
    }
  }

  /// `POST /api/session`
  pub async fn create_session(&self, spec: &NewSession) -> Result<MissionSession> {
    self.post("/session", &serde_json::to_value(spec)?).await
  }

  /// `PUT /api/session`
  pub async fn update_session(
    &self,
    session_id: Uuid,
    patch: &SessionPatch,
  ) -> Result<MissionSession> {
    self
      .put("/session", &json!({ "sessionId": session_id, "updates": patch }))
      .await
  }

  /// `DELETE /api/session/:id`
  pub async fn delete_session(&self, session_id: Uuid) -> Result<()> {
    let path = format!("/session/{session_id}");
    let what = format!("DELETE {path}");
    self.send(self.client.delete(self.url(&path)), &what).await?;
    Ok(())
  }

  // ── Update log and aggregates ─────────────────────────────────────────────

  pub async fn add_update(&self, session_id: Uuid, update: &NewUpdate) -> Result<MissionUpdate> {
    self
      .post("/updates", &json!({ "sessionId": session_id, "update": update }))
      .await
  }

  pub async fn updates(&self, session_id: Uuid) -> Result<Vec<MissionUpdate>> {
    self.get(&format!("/updates/{session_id}")).await
  }

  pub async fn add_milestone(
    &self,
    session_id: Uuid,
    milestone: &NewMilestone,
  ) -> Result<MissionMilestone> {
    let mut body = serde_json::to_value(milestone)?;
    body["sessionId"] = json!(session_id);
    self.post("/milestones", &body).await
  }

  pub async fn milestones(&self, session_id: Uuid) -> Result<Vec<MissionMilestone>> {
    self.get(&format!("/milestones/{session_id}")).await
  }

  pub async fn set_milestone_status(
    &self,
    milestone_id: Uuid,
    status: MilestoneStatus,
  ) -> Result<MissionMilestone> {
    self
      .put(&format!("/milestones/{milestone_id}"), &json!({ "status": status }))
      .await
  }

  pub async fn add_weather(&self, session_id: Uuid, sample: &NewWeather) -> Result<MissionWeather> {
    let mut body = serde_json::to_value(sample)?;
    body["sessionId"] = json!(session_id);
    self.post("/weather", &body).await
  }

  pub async fn latest_weather(&self, session_id: Uuid) -> Result<Option<MissionWeather>> {
    self.get(&format!("/weather/{session_id}")).await
  }

  pub async fn add_objective(&self, session_id: Uuid, objective: &str) -> Result<MissionObjective> {
    self
      .post("/objectives", &json!({ "sessionId": session_id, "objective": objective }))
      .await
  }

  pub async fn objectives(&self, session_id: Uuid) -> Result<Vec<MissionObjective>> {
    self.get(&format!("/objectives/{session_id}")).await
  }

  // ── Video ─────────────────────────────────────────────────────────────────

  pub async fn set_overlay(
    &self,
    session_id: Uuid,
    kind: OverlayKind,
    custom_text: Option<&str>,
  ) -> Result<VideoOverlay> {
    self
      .post(
        "/video-overlay",
        &json!({ "sessionId": session_id, "overlayType": kind, "customText": custom_text }),
      )
      .await
  }

  pub async fn overlay(&self, session_id: Uuid) -> Result<Option<VideoOverlay>> {
    self.get(&format!("/video-overlay/{session_id}")).await
  }

  pub async fn set_video_override(
    &self,
    session_id: Uuid,
    url: Option<&str>,
    is_active: bool,
  ) -> Result<VideoOverride> {
    self
      .post(
        "/video-override",
        &json!({ "sessionId": session_id, "url": url, "isActive": is_active }),
      )
      .await
  }

  pub async fn video_override(&self, session_id: Uuid) -> Result<Option<VideoOverride>> {
    self.get(&format!("/video-override/{session_id}")).await
  }

  // ── Feed catalogue ────────────────────────────────────────────────────────

  pub async fn current_feed(&self) -> Result<CurrentFeed> {
    self.get("/iss-feed/current").await
  }

  pub async fn feeds(&self) -> Result<Vec<IssLiveFeed>> {
    self.get("/iss-feed/feeds").await
  }

  pub async fn add_feed(&self, feed: &NewFeed) -> Result<IssLiveFeed> {
    self
      .post("/iss-feed/feeds", &serde_json::to_value(feed)?)
      .await
  }

  pub async fn schedules(&self) -> Result<Vec<LaunchFeedSchedule>> {
    self.get("/iss-feed/schedules").await
  }

  pub async fn add_schedule(&self, schedule: &NewSchedule) -> Result<LaunchFeedSchedule> {
    self
      .post("/iss-feed/schedule", &serde_json::to_value(schedule)?)
      .await
  }

  /// `POST /api/iss-feed/schedules/:launchId/switch`
  pub async fn mark_switched(&self, launch_id: &str) -> Result<()> {
    let path = format!("/iss-feed/schedules/{launch_id}/switch");
    let what = format!("POST {path}");
    self.send(self.client.post(self.url(&path)), &what).await?;
    Ok(())
  }
}
