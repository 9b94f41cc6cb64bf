//! Handlers for the per-session update log and aggregates.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/updates` | Body: `{"sessionId": …, "update": {…}}` |
//! | `GET`  | `/updates/:sessionId` | Newest first |
//! | `POST` | `/milestones` | Body: `{"sessionId": …, "name": …, "timeOffset": …, "sortOrder": …}` |
//! | `GET`  | `/milestones/:sessionId` | Ordered by `sortOrder` |
//! | `PUT`  | `/milestones/:id` | Body: `{"status": "completed"}` |
//! | `POST` | `/weather` | Body: `{"sessionId": …, <sample fields>}` |
//! | `GET`  | `/weather/:sessionId` | Latest sample or `null` |
//! | `POST` | `/objectives` | Body: `{"sessionId": …, "objective": "…"}` |
//! | `GET`  | `/objectives/:sessionId` | Ordered by `sortOrder` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mctl_core::log::{
  MilestoneStatus, MissionMilestone, MissionObjective, MissionUpdate, MissionWeather,
  NewMilestone, NewUpdate, NewWeather,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{Backend, Control, error::ApiError};

// ─── Updates ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUpdateBody {
  pub session_id: Uuid,
  pub update:     NewUpdate,
}

/// `POST /updates`
pub async fn add_update<S: Backend>(
  State(control): State<Control<S>>,
  Json(body): Json<AddUpdateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let update = control.add_update(body.session_id, body.update).await?;
  Ok((StatusCode::CREATED, Json(update)))
}

/// `GET /updates/:sessionId`
pub async fn list_updates<S: Backend>(
  State(control): State<Control<S>>,
  Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<MissionUpdate>>, ApiError> {
  Ok(Json(control.list_updates(session_id).await?))
}

// ─── Milestones ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMilestoneBody {
  pub session_id: Uuid,
  #[serde(flatten)]
  pub milestone:  NewMilestone,
}

/// `POST /milestones`
pub async fn add_milestone<S: Backend>(
  State(control): State<Control<S>>,
  Json(body): Json<AddMilestoneBody>,
) -> Result<impl IntoResponse, ApiError> {
  let milestone = control
    .add_milestone(body.session_id, body.milestone)
    .await?;
  Ok((StatusCode::CREATED, Json(milestone)))
}

/// `GET /milestones/:sessionId`
pub async fn list_milestones<S: Backend>(
  State(control): State<Control<S>>,
  Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<MissionMilestone>>, ApiError> {
  Ok(Json(control.list_milestones(session_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct MilestoneStatusBody {
  pub status: MilestoneStatus,
}

/// `PUT /milestones/:id`
pub async fn set_milestone_status<S: Backend>(
  State(control): State<Control<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MilestoneStatusBody>,
) -> Result<Json<MissionMilestone>, ApiError> {
  Ok(Json(control.update_milestone_status(id, body.status).await?))
}

// ─── Weather ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWeatherBody {
  pub session_id: Uuid,
  #[serde(flatten)]
  pub sample:     NewWeather,
}

/// `POST /weather`
pub async fn add_weather<S: Backend>(
  State(control): State<Control<S>>,
  Json(body): Json<AddWeatherBody>,
) -> Result<impl IntoResponse, ApiError> {
  let sample = control.add_weather(body.session_id, body.sample).await?;
  Ok((StatusCode::CREATED, Json(sample)))
}

/// `GET /weather/:sessionId`
pub async fn latest_weather<S: Backend>(
  State(control): State<Control<S>>,
  Path(session_id): Path<Uuid>,
) -> Result<Json<Option<MissionWeather>>, ApiError> {
  Ok(Json(control.latest_weather(session_id).await?))
}

// ─── Objectives ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddObjectiveBody {
  pub session_id: Uuid,
  pub objective:  String,
}

/// `POST /objectives`
pub async fn add_objective<S: Backend>(
  State(control): State<Control<S>>,
  Json(body): Json<AddObjectiveBody>,
) -> Result<impl IntoResponse, ApiError> {
  let objective = control
    .add_objective(body.session_id, body.objective)
    .await?;
  Ok((StatusCode::CREATED, Json(objective)))
}

/// `GET /objectives/:sessionId`
pub async fn list_objectives<S: Backend>(
  State(control): State<Control<S>>,
  Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<MissionObjective>>, ApiError> {
  Ok(Json(control.list_objectives(session_id).await?))
}
