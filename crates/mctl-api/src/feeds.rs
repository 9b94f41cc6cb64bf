//! Handlers for `/iss-feed` endpoints: the live feed catalogue and launch
//! feed schedule.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/iss-feed/current` | Resolved feed for the active session |
//! | `GET`  | `/iss-feed/feeds` | All catalogue feeds |
//! | `POST` | `/iss-feed/feeds` | Body: `NewFeed` |
//! | `POST` | `/iss-feed/schedule` | Body: `NewSchedule`; upserts by `launchId` |
//! | `GET`  | `/iss-feed/schedules` | Ordered by `launchDate` |
//! | `POST` | `/iss-feed/schedules/:launchId/switch` | Sets `isSwitched`; 404 if unknown |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mctl_core::feed::{CurrentFeed, IssLiveFeed, LaunchFeedSchedule, NewFeed, NewSchedule};

use crate::{Backend, Control, error::ApiError};

/// `GET /iss-feed/current`
pub async fn current<S: Backend>(
  State(control): State<Control<S>>,
) -> Result<Json<CurrentFeed>, ApiError> {
  Ok(Json(control.current_feed().await?))
}

/// `GET /iss-feed/feeds`
pub async fn list_feeds<S: Backend>(
  State(control): State<Control<S>>,
) -> Result<Json<Vec<IssLiveFeed>>, ApiError> {
  Ok(Json(control.feeds().await?))
}

/// `POST /iss-feed/feeds`
pub async fn add_feed<S: Backend>(
  State(control): State<Control<S>>,
  Json(feed): Json<NewFeed>,
) -> Result<impl IntoResponse, ApiError> {
  let feed = control.add_feed(feed).await?;
  Ok((StatusCode::CREATED, Json(feed)))
}

/// `POST /iss-feed/schedule`
pub async fn add_schedule<S: Backend>(
  State(control): State<Control<S>>,
  Json(schedule): Json<NewSchedule>,
) -> Result<Json<LaunchFeedSchedule>, ApiError> {
  Ok(Json(control.add_schedule(schedule).await?))
}

/// `GET /iss-feed/schedules`
pub async fn list_schedules<S: Backend>(
  State(control): State<Control<S>>,
) -> Result<Json<Vec<LaunchFeedSchedule>>, ApiError> {
  Ok(Json(control.schedules().await?))
}

/// `POST /iss-feed/schedules/:launchId/switch`
pub async fn switch<S: Backend>(
  State(control): State<Control<S>>,
  Path(launch_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  control.mark_switched(launch_id).await?;
  Ok(StatusCode::OK)
}
