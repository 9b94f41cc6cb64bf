//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use mctl_core::{
  control::{ControlConfig, MissionControl},
  feed::NewSchedule,
  store::LaunchCatalogue as _,
};
use mctl_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(MissionControl::new(store, ControlConfig::default())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create_session(app: &Router, name: &str) -> String {
  let (status, body) = send(
    app,
    Method::POST,
    "/session",
    Some(json!({
      "missionId": "ll2-artemis-2",
      "missionName": name,
      "agency": "NASA",
      "launchDate": (Utc::now() + Duration::hours(1)).to_rfc3339(),
      "status": "upcoming",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["sessionId"].as_str().unwrap().to_owned()
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn no_active_session_is_404() {
  let app = app().await;
  let (status, body) = send(&app, Method::GET, "/active-session", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn create_then_fetch_active() {
  let app = app().await;
  let id = create_session(&app, "Artemis II").await;

  let (status, body) = send(&app, Method::GET, "/active-session", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["sessionId"], id);
  assert_eq!(body["missionName"], "Artemis II");
  assert_eq!(body["isLive"], false);
  assert_eq!(body["issFeedEnabled"], true);
}

#[tokio::test]
async fn second_create_supersedes_first() {
  let app = app().await;
  let first = create_session(&app, "S1").await;
  let second = create_session(&app, "S2").await;

  let (_, body) = send(&app, Method::GET, "/active-session", None).await;
  assert_eq!(body["sessionId"], second);

  let (status, updates) = send(&app, Method::GET, &format!("/updates/{first}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updates.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn update_session_merges_and_clears() {
  let app = app().await;
  let id = create_session(&app, "Merge").await;

  let (status, body) = send(
    &app,
    Method::PUT,
    "/session",
    Some(json!({
      "sessionId": id,
      "updates": { "status": "live", "isLive": true, "liveStreamUrl": null },
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "live");
  assert_eq!(body["isLive"], true);
  assert_eq!(body["missionName"], "Merge");
}

#[tokio::test]
async fn update_of_unknown_session_is_404() {
  let app = app().await;
  let (status, _) = send(
    &app,
    Method::PUT,
    "/session",
    Some(json!({ "sessionId": uuid::Uuid::new_v4(), "updates": { "isLive": true } })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_idempotent() {
  let app = app().await;
  let id = create_session(&app, "Bye").await;
  for _ in 0..2 {
    let (status, _) = send(&app, Method::DELETE, &format!("/session/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }
  let (status, _) = send(&app, Method::GET, "/active-session", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn updates_list_newest_first() {
  let app = app().await;
  let id = create_session(&app, "Log").await;

  let (status, body) = send(
    &app,
    Method::POST,
    "/updates",
    Some(json!({
      "sessionId": id,
      "update": { "title": "Tanking", "content": "LOX load started", "author": "LD" },
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["updateType"], "general");
  assert_eq!(body["priority"], "normal");

  let (_, list) = send(&app, Method::GET, &format!("/updates/{id}"), None).await;
  assert_eq!(list[0]["title"], "Tanking");
  assert_eq!(list[1]["title"], "Mission selected");
}

#[tokio::test]
async fn update_missing_author_is_400() {
  let app = app().await;
  let id = create_session(&app, "Log").await;
  let (status, _) = send(
    &app,
    Method::POST,
    "/updates",
    Some(json!({
      "sessionId": id,
      "update": { "title": "T", "content": "C", "author": "" },
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn milestones_add_list_and_set_status() {
  let app = app().await;
  let id = create_session(&app, "Steps").await;

  let (status, added) = send(
    &app,
    Method::POST,
    "/milestones",
    Some(json!({
      "sessionId": id,
      "name": "Fairing Sep",
      "timeOffset": "T+00:03:30",
      "sortOrder": 8,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(added["status"], "upcoming");

  let (_, list) = send(&app, Method::GET, &format!("/milestones/{id}"), None).await;
  let list = list.as_array().unwrap();
  assert_eq!(list.len(), 8);
  assert_eq!(list[7]["name"], "Fairing Sep");

  let milestone_id = added["id"].as_str().unwrap();
  for _ in 0..2 {
    let (status, body) = send(
      &app,
      Method::PUT,
      &format!("/milestones/{milestone_id}"),
      Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
  }
}

#[tokio::test]
async fn weather_latest_wins_and_null_when_empty() {
  let app = app().await;
  let id = create_session(&app, "Wx").await;

  let (status, body) = send(&app, Method::GET, &format!("/weather/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.is_null());

  for verdict in ["GO", "NO-GO"] {
    let (status, _) = send(
      &app,
      Method::POST,
      "/weather",
      Some(json!({
        "sessionId": id,
        "temperature": 21.0,
        "windSpeed": 14.0,
        "visibility": 10.0,
        "humidity": 70.0,
        "goNoGo": verdict,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (_, body) = send(&app, Method::GET, &format!("/weather/{id}"), None).await;
  assert_eq!(body["goNoGo"], "NO-GO");
}

#[tokio::test]
async fn objectives_are_appended() {
  let app = app().await;
  let id = create_session(&app, "Obj").await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/objectives",
    Some(json!({ "sessionId": id, "objective": "Reach orbit" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["sortOrder"], 1);

  let (_, list) = send(&app, Method::GET, &format!("/objectives/{id}"), None).await;
  assert_eq!(list[0]["objective"], "Reach orbit");
}

// ─── Video ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn custom_overlay_round_trip_and_validation() {
  let app = app().await;
  let id = create_session(&app, "Overlay").await;

  let (status, _) = send(
    &app,
    Method::POST,
    "/video-overlay",
    Some(json!({ "sessionId": id, "overlayType": "custom" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    Method::POST,
    "/video-overlay",
    Some(json!({ "sessionId": id, "overlayType": "custom", "customText": "Hold for weather" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = send(&app, Method::GET, &format!("/video-overlay/{id}"), None).await;
  assert_eq!(body["overlayType"], "custom");
  assert_eq!(body["customText"], "Hold for weather");
  assert_eq!(body["isActive"], true);
}

#[tokio::test]
async fn active_override_drives_current_feed() {
  let app = app().await;
  let id = create_session(&app, "Sim").await;

  let (status, _) = send(
    &app,
    Method::POST,
    "/video-override",
    Some(json!({ "sessionId": id, "isActive": true })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    Method::POST,
    "/video-override",
    Some(json!({ "sessionId": id, "url": "https://example.com/sim", "isActive": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, current) = send(&app, Method::GET, "/iss-feed/current", None).await;
  assert_eq!(current["url"], "https://example.com/sim");
  assert_eq!(current["isLaunchFeed"], false);
}

// ─── Feeds ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scheduled_feed_preferred_over_default() {
  let app = app().await;
  create_session(&app, "Launch").await;

  let (status, _) = send(
    &app,
    Method::POST,
    "/iss-feed/feeds",
    Some(json!({
      "title": "ISS HD Earth Viewing",
      "embedUrl": "https://example.com/iss",
      "isDefault": true,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, schedule) = send(
    &app,
    Method::POST,
    "/iss-feed/schedule",
    Some(json!({
      "launchId": "ll2-1",
      "launchName": "Artemis II",
      "launchDate": (Utc::now() + Duration::minutes(20)).to_rfc3339(),
      "feedUrl": "https://example.com/artemis",
      "switchTimeMinutes": 30,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(schedule["isSwitched"], false);

  let (_, current) = send(&app, Method::GET, "/iss-feed/current", None).await;
  assert_eq!(current["isLaunchFeed"], true);
  assert_eq!(current["url"], "https://example.com/artemis");
  assert_eq!(current["launchInfo"]["launchId"], "ll2-1");

  let (_, schedules) = send(&app, Method::GET, "/iss-feed/schedules", None).await;
  assert_eq!(schedules[0]["isSwitched"], true);
}

#[tokio::test]
async fn out_of_range_switch_time_is_400() {
  let app = app().await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/iss-feed/schedule",
    Some(json!({
      "launchId": "ll2-far",
      "launchName": "Far Out",
      "launchDate": (Utc::now() + Duration::minutes(20)).to_rfc3339(),
      "feedUrl": "https://example.com/far",
      "switchTimeMinutes": 9_000_000_000_000_i64,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (_, schedules) = send(&app, Method::GET, "/iss-feed/schedules", None).await;
  assert_eq!(schedules, json!([]));
}

#[tokio::test]
async fn current_feed_survives_unrepresentable_window() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let control = Arc::new(MissionControl::new(store, ControlConfig::default()));
  // Written straight to the store, as a row from an older build would be.
  control
    .store()
    .upsert_schedule(
      NewSchedule {
        launch_id:           "ll2-far".into(),
        launch_name:         "Far Out".into(),
        launch_date:         Utc::now() + Duration::minutes(20),
        feed_url:            Some("https://example.com/far".into()),
        feed_id:             None,
        switch_time_minutes: 9_000_000_000_000,
      }
      .into_schedule(),
    )
    .await
    .unwrap();
  let app = api_router(control);

  let (status, current) = send(&app, Method::GET, "/iss-feed/current", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(current["isLaunchFeed"], false);
}

#[tokio::test]
async fn switch_unknown_launch_is_404() {
  let app = app().await;
  let (status, _) = send(&app, Method::POST, "/iss-feed/schedules/nope/switch", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
