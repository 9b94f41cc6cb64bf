//! Handlers for the session lifecycle.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/active-session` | 404 when no session is active |
//! | `POST`   | `/session` | Body: `NewSession`; supersedes the active session |
//! | `PUT`    | `/session` | Body: `{"sessionId": …, "updates": {…}}` |
//! | `DELETE` | `/session/:sessionId` | Idempotent, always 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mctl_core::session::{MissionSession, NewSession, SessionPatch};
use serde::Deserialize;
use uuid::Uuid;

use crate::{Backend, Control, error::ApiError};

// ─── Active ───────────────────────────────────────────────────────────────────

/// `GET /active-session`
pub async fn active<S: Backend>(
  State(control): State<Control<S>>,
) -> Result<Json<MissionSession>, ApiError> {
  let session = control
    .active_session()
    .await?
    .ok_or_else(|| ApiError::NotFound("no active session".into()))?;
  Ok(Json(session))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /session`
pub async fn create<S: Backend>(
  State(control): State<Control<S>>,
  Json(spec): Json<NewSession>,
) -> Result<impl IntoResponse, ApiError> {
  let session = control.create_session(spec).await?;
  Ok((StatusCode::CREATED, Json(session)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub session_id: Uuid,
  #[serde(default)]
  pub updates:    SessionPatch,
}

/// `PUT /session`
pub async fn update<S: Backend>(
  State(control): State<Control<S>>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<MissionSession>, ApiError> {
  let session = control
    .update_session(body.session_id, body.updates)
    .await?;
  Ok(Json(session))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /session/:sessionId`
pub async fn delete<S: Backend>(
  State(control): State<Control<S>>,
  Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  control.delete_session(session_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
