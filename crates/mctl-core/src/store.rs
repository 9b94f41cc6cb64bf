//! The `SessionStore` and `LaunchCatalogue` traits.
//!
//! Both are implemented by storage backends (e.g. `mctl-store-sqlite`).
//! [`crate::control::MissionControl`] and the HTTP layer depend on these
//! abstractions, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  error::StoreError,
  feed::{IssLiveFeed, LaunchFeedSchedule},
  log::{
    MilestoneStatus, MissionMilestone, MissionObjective, MissionUpdate, MissionWeather,
    NewMilestone,
  },
  overlay::{VideoOverlay, VideoOverride},
  session::{MissionSession, SessionPatch},
};

// ─── Supersede ───────────────────────────────────────────────────────────────

/// Sub-resources written together with a new session.
#[derive(Debug, Clone, Default)]
pub struct SessionSeed {
  pub milestones: Vec<NewMilestone>,
  pub objectives: Vec<String>,
}

/// Result of [`SessionStore::supersede_session`].
#[derive(Debug, Clone)]
pub struct Superseded {
  pub session:    MissionSession,
  /// The previously active session, now deleted.
  pub retired:    Option<Uuid>,
  pub milestones: Vec<MissionMilestone>,
  pub objectives: Vec<MissionObjective>,
}

// ─── Session store ───────────────────────────────────────────────────────────

/// Durable record of the single active session and its sub-resources.
///
/// Sub-resource rows hold their `session_id` as a weak reference: deleting a
/// session leaves its updates, milestones, weather and objectives in place.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SessionStore: Send + Sync {
  type Error: StoreError;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Atomically retire the active session (if any), insert `session`, make
  /// it the active one, and insert `seed`.
  ///
  /// Either everything is written or nothing is. Two concurrent calls
  /// serialise; the later one wins the active pointer.
  fn supersede_session(
    &self,
    session: MissionSession,
    seed: SessionSeed,
  ) -> impl Future<Output = Result<Superseded, Self::Error>> + Send + '_;

  /// Retrieve a session by id, expired or not. Returns `None` if absent.
  fn get_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<MissionSession>, Self::Error>> + Send + '_;

  /// The active session, unless it has expired as of `now`.
  fn active_session(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<MissionSession>, Self::Error>> + Send + '_;

  /// Write the fields present in `patch`, leaving the others untouched.
  ///
  /// Returns `None` if the session is absent or expired as of `now`.
  fn update_session(
    &self,
    session_id: Uuid,
    patch: SessionPatch,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<MissionSession>, Self::Error>> + Send + '_;

  /// Delete a session. Returns `false` if it was already absent.
  fn delete_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Update log ────────────────────────────────────────────────────────

  fn insert_update(
    &self,
    update: MissionUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Newest first.
  fn list_updates(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MissionUpdate>, Self::Error>> + Send + '_;

  // ── Milestones ────────────────────────────────────────────────────────

  fn insert_milestone(
    &self,
    milestone: MissionMilestone,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Ordered by `sort_order`.
  fn list_milestones(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MissionMilestone>, Self::Error>> + Send + '_;

  /// Set a milestone's status. Returns the record and whether it changed,
  /// or `None` if the milestone does not exist.
  fn set_milestone_status(
    &self,
    milestone_id: Uuid,
    status: MilestoneStatus,
  ) -> impl Future<Output = Result<Option<(MissionMilestone, bool)>, Self::Error>> + Send + '_;

  // ── Weather ───────────────────────────────────────────────────────────

  fn insert_weather(
    &self,
    sample: MissionWeather,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The sample with the greatest `recorded_at`.
  fn latest_weather(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<MissionWeather>, Self::Error>> + Send + '_;

  // ── Objectives ────────────────────────────────────────────────────────

  /// Append an objective after the session's current last one.
  fn append_objective(
    &self,
    session_id: Uuid,
    objective: String,
  ) -> impl Future<Output = Result<MissionObjective, Self::Error>> + Send + '_;

  /// Ordered by `sort_order`.
  fn list_objectives(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MissionObjective>, Self::Error>> + Send + '_;

  // ── Single-slot video state ───────────────────────────────────────────

  /// Replace the session's overlay slot.
  fn put_overlay(
    &self,
    overlay: VideoOverlay,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_overlay(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<VideoOverlay>, Self::Error>> + Send + '_;

  /// Replace the session's video override slot.
  fn put_video_override(
    &self,
    video_override: VideoOverride,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_video_override(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<VideoOverride>, Self::Error>> + Send + '_;
}

// ─── Launch catalogue ────────────────────────────────────────────────────────

/// Live feeds and launch feed schedules.
pub trait LaunchCatalogue: Send + Sync {
  type Error: StoreError;

  fn insert_feed(
    &self,
    feed: IssLiveFeed,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_feeds(
    &self,
  ) -> impl Future<Output = Result<Vec<IssLiveFeed>, Self::Error>> + Send + '_;

  /// Insert a schedule entry, or replace the entry with the same
  /// `launch_id`. A replaced entry keeps its `is_switched` flag.
  fn upsert_schedule(
    &self,
    schedule: LaunchFeedSchedule,
  ) -> impl Future<Output = Result<LaunchFeedSchedule, Self::Error>> + Send + '_;

  /// Ordered by `launch_date`.
  fn list_schedules(
    &self,
  ) -> impl Future<Output = Result<Vec<LaunchFeedSchedule>, Self::Error>> + Send + '_;

  /// Set `is_switched` on a schedule entry. Setting it twice is a no-op.
  /// Returns `false` if no entry has this `launch_id`.
  fn mark_switched(
    &self,
    launch_id: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
