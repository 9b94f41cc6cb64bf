//! Handlers for the per-session overlay and video override slots.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/video-overlay` | Body: `{"sessionId": …, "overlayType": "custom", "customText": "…"}` |
//! | `GET`  | `/video-overlay/:sessionId` | Slot or `null` |
//! | `POST` | `/video-override` | Body: `{"sessionId": …, "url": "…", "isActive": true}` |
//! | `GET`  | `/video-override/:sessionId` | Slot or `null` |

use axum::{
  Json,
  extract::{Path, State},
};
use mctl_core::overlay::{OverlayKind, VideoOverlay, VideoOverride};
use serde::Deserialize;
use uuid::Uuid;

use crate::{Backend, Control, error::ApiError};

// ─── Overlay ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayBody {
  pub session_id:   Uuid,
  pub overlay_type: OverlayKind,
  #[serde(default)]
  pub custom_text:  Option<String>,
}

/// `POST /video-overlay`
pub async fn set_overlay<S: Backend>(
  State(control): State<Control<S>>,
  Json(body): Json<OverlayBody>,
) -> Result<Json<VideoOverlay>, ApiError> {
  let slot = control
    .set_overlay(body.session_id, body.overlay_type, body.custom_text)
    .await?;
  Ok(Json(slot))
}

/// `GET /video-overlay/:sessionId`
pub async fn get_overlay<S: Backend>(
  State(control): State<Control<S>>,
  Path(session_id): Path<Uuid>,
) -> Result<Json<Option<VideoOverlay>>, ApiError> {
  Ok(Json(control.overlay(session_id).await?))
}

// ─── Override ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideBody {
  pub session_id: Uuid,
  #[serde(default)]
  pub url:        Option<String>,
  pub is_active:  bool,
}

/// `POST /video-override`
pub async fn set_override<S: Backend>(
  State(control): State<Control<S>>,
  Json(body): Json<OverrideBody>,
) -> Result<Json<VideoOverride>, ApiError> {
  let slot = control
    .set_video_override(body.session_id, body.url, body.is_active)
    .await?;
  Ok(Json(slot))
}

/// `GET /video-override/:sessionId`
pub async fn get_override<S: Backend>(
  State(control): State<Control<S>>,
  Path(session_id): Path<Uuid>,
) -> Result<Json<Option<VideoOverride>>, ApiError> {
  Ok(Json(control.video_override(session_id).await?))
}
