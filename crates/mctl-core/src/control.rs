//! [`MissionControl`], the session lifecycle manager and sub-resource
//! aggregators, generic over any store backend.
//!
//! Every successful session or milestone mutation appends an audit entry to
//! the session's update log. Audit writes are best-effort: a failure is
//! logged and never fails the mutation it describes.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  feed::{
    CurrentFeed, IssLiveFeed, LaunchFeedSchedule, MAX_SWITCH_TIME_MINUTES, NewFeed, NewSchedule,
    default_feed,
  },
  log::{
    MilestoneStatus, MissionMilestone, MissionObjective, MissionUpdate, MissionWeather,
    NewMilestone, NewUpdate, NewWeather, UpdateType, default_milestones,
  },
  overlay::{Overlay, OverlayKind, VideoOverlay, VideoOverride},
  resolve::{
    DEFAULT_LAUNCH_GRACE_MINUTES, ResolveInput, Resolution, VideoSource, resolve_video_source,
  },
  session::{DEFAULT_SESSION_TTL_HOURS, MissionSession, NewSession, SessionPatch},
  store::{LaunchCatalogue, SessionSeed, SessionStore},
};

/// Tunables for [`MissionControl`].
#[derive(Debug, Clone, Copy)]
pub struct ControlConfig {
  /// Lifetime of a newly created session.
  pub session_ttl:  Duration,
  /// How long after launch a scheduled feed keeps playing.
  pub launch_grace: Duration,
}

impl Default for ControlConfig {
  fn default() -> Self {
    Self {
      session_ttl:  Duration::hours(DEFAULT_SESSION_TTL_HOURS),
      launch_grace: Duration::minutes(DEFAULT_LAUNCH_GRACE_MINUTES),
    }
  }
}

/// Coordinates the single active broadcast session.
pub struct MissionControl<S> {
  store:  S,
  config: ControlConfig,
}

impl<S> MissionControl<S>
where
  S: SessionStore + LaunchCatalogue,
{
  pub fn new(store: S, config: ControlConfig) -> Self { Self { store, config } }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &ControlConfig { &self.config }

  // ── Session lifecycle ─────────────────────────────────────────────────

  /// Supersede the active session with a new one built from `spec`.
  ///
  /// The old session is deleted, the new one becomes active, and its
  /// milestone and objective seed is written in the same store transaction.
  pub async fn create_session(&self, mut spec: NewSession) -> Result<MissionSession> {
    if spec.mission_id.trim().is_empty() || spec.mission_name.trim().is_empty() {
      return Err(Error::Validation("missionId and missionName are required".into()));
    }

    let now = Utc::now();
    let seed = SessionSeed {
      milestones: spec.milestones.take().unwrap_or_else(default_milestones),
      objectives: std::mem::take(&mut spec.objectives)
        .into_iter()
        .filter(|o| !o.trim().is_empty())
        .collect(),
    };
    let session = spec.into_session(now, self.config.session_ttl);

    let superseded = self
      .store
      .supersede_session(session, seed)
      .await
      .map_err(Error::store)?;
    let session = superseded.session;

    if let Some(retired) = superseded.retired {
      info!(%retired, session_id = %session.session_id, "superseded active session");
    }
    info!(
      session_id = %session.session_id,
      mission = %session.mission_name,
      milestones = superseded.milestones.len(),
      objectives = superseded.objectives.len(),
      "created session",
    );

    self
      .audit(
        session.session_id,
        NewUpdate::system(
          "Mission selected",
          format!(
            "{} ({}) selected for live coverage; launch {}",
            session.mission_name,
            session.agency,
            session.launch_date.to_rfc3339(),
          ),
        ),
      )
      .await;

    Ok(session)
  }

  /// Merge `patch` into a live (non-expired) session.
  pub async fn update_session(
    &self,
    session_id: Uuid,
    patch: SessionPatch,
  ) -> Result<MissionSession> {
    let now = Utc::now();
    let before = self.require_session(session_id, now).await?;
    if patch.is_empty() {
      return Ok(before);
    }

    let after = self
      .store
      .update_session(session_id, patch.clone(), now)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SessionNotFound(session_id))?;

    let audit = if before.status != after.status {
      let mut entry = NewUpdate::system(
        "Status changed",
        format!("{} status changed: {} -> {}", after.mission_name, before.status, after.status),
      );
      entry.update_type = UpdateType::Status;
      entry
    } else {
      NewUpdate::system("Session updated", describe_patch(&patch))
    };
    self.audit(session_id, audit).await;

    Ok(after)
  }

  /// The most recently created session that has not expired.
  pub async fn active_session(&self) -> Result<Option<MissionSession>> {
    self
      .store
      .active_session(Utc::now())
      .await
      .map_err(Error::store)
  }

  /// Idempotent; deleting an absent session is not an error.
  pub async fn delete_session(&self, session_id: Uuid) -> Result<()> {
    let removed = self
      .store
      .delete_session(session_id)
      .await
      .map_err(Error::store)?;
    if removed {
      info!(%session_id, "deleted session");
    } else {
      debug!(%session_id, "delete of absent session");
    }
    Ok(())
  }

  // ── Update log ────────────────────────────────────────────────────────

  pub async fn add_update(&self, session_id: Uuid, update: NewUpdate) -> Result<MissionUpdate> {
    update.validate()?;
    let now = Utc::now();
    self.require_session(session_id, now).await?;
    let entry = update.into_update(session_id, now);
    self
      .store
      .insert_update(entry.clone())
      .await
      .map_err(Error::store)?;
    Ok(entry)
  }

  /// Newest first. Works for superseded sessions too.
  pub async fn list_updates(&self, session_id: Uuid) -> Result<Vec<MissionUpdate>> {
    self
      .store
      .list_updates(session_id)
      .await
      .map_err(Error::store)
  }

  // ── Milestones ────────────────────────────────────────────────────────

  pub async fn add_milestone(
    &self,
    session_id: Uuid,
    milestone: NewMilestone,
  ) -> Result<MissionMilestone> {
    if milestone.name.trim().is_empty() {
      return Err(Error::Validation("milestone name is required".into()));
    }
    self.require_session(session_id, Utc::now()).await?;
    let milestone = milestone.into_milestone(session_id);
    self
      .store
      .insert_milestone(milestone.clone())
      .await
      .map_err(Error::store)?;
    Ok(milestone)
  }

  pub async fn list_milestones(&self, session_id: Uuid) -> Result<Vec<MissionMilestone>> {
    self
      .store
      .list_milestones(session_id)
      .await
      .map_err(Error::store)
  }

  /// Setting the status a milestone already has returns it unchanged and
  /// writes no audit entry.
  pub async fn update_milestone_status(
    &self,
    milestone_id: Uuid,
    status: MilestoneStatus,
  ) -> Result<MissionMilestone> {
    let (milestone, changed) = self
      .store
      .set_milestone_status(milestone_id, status)
      .await
      .map_err(Error::store)?
      .ok_or(Error::MilestoneNotFound(milestone_id))?;

    if changed {
      let mut entry = NewUpdate::system(
        format!("Milestone: {}", milestone.name),
        format!("{} ({}) is now {}", milestone.name, milestone.time_offset, status),
      );
      entry.update_type = UpdateType::Milestone;
      self.audit(milestone.session_id, entry).await;
    }
    Ok(milestone)
  }

  // ── Weather ───────────────────────────────────────────────────────────

  pub async fn add_weather(&self, session_id: Uuid, sample: NewWeather) -> Result<MissionWeather> {
    let now = Utc::now();
    self.require_session(session_id, now).await?;
    let sample = sample.into_weather(session_id, now);
    self
      .store
      .insert_weather(sample.clone())
      .await
      .map_err(Error::store)?;
    Ok(sample)
  }

  pub async fn latest_weather(&self, session_id: Uuid) -> Result<Option<MissionWeather>> {
    self
      .store
      .latest_weather(session_id)
      .await
      .map_err(Error::store)
  }

  // ── Objectives ────────────────────────────────────────────────────────

  pub async fn add_objective(
    &self,
    session_id: Uuid,
    objective: String,
  ) -> Result<MissionObjective> {
    if objective.trim().is_empty() {
      return Err(Error::Validation("objective text is required".into()));
    }
    self.require_session(session_id, Utc::now()).await?;
    self
      .store
      .append_objective(session_id, objective)
      .await
      .map_err(Error::store)
  }

  pub async fn list_objectives(&self, session_id: Uuid) -> Result<Vec<MissionObjective>> {
    self
      .store
      .list_objectives(session_id)
      .await
      .map_err(Error::store)
  }

  // ── Overlay and override ──────────────────────────────────────────────

  /// Replace the overlay slot. `custom` without text is a validation error.
  pub async fn set_overlay(
    &self,
    session_id: Uuid,
    kind: OverlayKind,
    custom_text: Option<String>,
  ) -> Result<VideoOverlay> {
    let overlay = Overlay::from_parts(kind, custom_text)?;
    let now = Utc::now();
    self.require_session(session_id, now).await?;

    let slot = VideoOverlay::new(session_id, overlay, now);
    self
      .store
      .put_overlay(slot.clone())
      .await
      .map_err(Error::store)?;

    let content = match slot.overlay.custom_text() {
      Some(text) => format!("Overlay set to {kind}: {text}"),
      None => format!("Overlay set to {kind}"),
    };
    self
      .audit(session_id, NewUpdate::system("Overlay changed", content))
      .await;
    Ok(slot)
  }

  pub async fn overlay(&self, session_id: Uuid) -> Result<Option<VideoOverlay>> {
    self
      .store
      .get_overlay(session_id)
      .await
      .map_err(Error::store)
  }

  /// Replace the video override slot. An active override wins over every
  /// automatic source on the viewers' next poll.
  pub async fn set_video_override(
    &self,
    session_id: Uuid,
    url: Option<String>,
    is_active: bool,
  ) -> Result<VideoOverride> {
    let now = Utc::now();
    let slot = VideoOverride::new(session_id, url, is_active, now)?;
    self.require_session(session_id, now).await?;
    self
      .store
      .put_video_override(slot.clone())
      .await
      .map_err(Error::store)?;

    let content = match slot.active_url() {
      Some(url) => format!("Video override active: {url}"),
      None => "Video override cleared".to_owned(),
    };
    self
      .audit(session_id, NewUpdate::system("Video source", content))
      .await;
    Ok(slot)
  }

  pub async fn video_override(&self, session_id: Uuid) -> Result<Option<VideoOverride>> {
    self
      .store
      .get_video_override(session_id)
      .await
      .map_err(Error::store)
  }

  // ── Catalogue ─────────────────────────────────────────────────────────

  pub async fn add_feed(&self, feed: NewFeed) -> Result<IssLiveFeed> {
    if feed.embed_url.trim().is_empty() {
      return Err(Error::Validation("embedUrl is required".into()));
    }
    let feed = feed.into_feed();
    self
      .store
      .insert_feed(feed.clone())
      .await
      .map_err(Error::store)?;
    Ok(feed)
  }

  pub async fn feeds(&self) -> Result<Vec<IssLiveFeed>> {
    self.store.list_feeds().await.map_err(Error::store)
  }

  pub async fn add_schedule(&self, schedule: NewSchedule) -> Result<LaunchFeedSchedule> {
    if schedule.launch_id.trim().is_empty() {
      return Err(Error::Validation("launchId is required".into()));
    }
    if !(0..=MAX_SWITCH_TIME_MINUTES).contains(&schedule.switch_time_minutes) {
      return Err(Error::Validation(format!(
        "switchTimeMinutes must be between 0 and {MAX_SWITCH_TIME_MINUTES}"
      )));
    }
    self
      .store
      .upsert_schedule(schedule.into_schedule())
      .await
      .map_err(Error::store)
  }

  pub async fn schedules(&self) -> Result<Vec<LaunchFeedSchedule>> {
    self.store.list_schedules().await.map_err(Error::store)
  }

  /// Idempotent one-way switch of a schedule entry.
  pub async fn mark_switched(&self, launch_id: String) -> Result<()> {
    let found = self
      .store
      .mark_switched(launch_id.clone())
      .await
      .map_err(Error::store)?;
    if found { Ok(()) } else { Err(Error::ScheduleNotFound(launch_id)) }
  }

  /// Resolve the feed a viewer of the active session should see right now,
  /// persisting the switch of a newly selected schedule entry.
  pub async fn current_feed(&self) -> Result<CurrentFeed> {
    let now = Utc::now();
    let session = self.active_session().await?;
    let video_override = match &session {
      Some(s) => self.video_override(s.session_id).await?,
      None => None,
    };
    let schedules = self.schedules().await?;
    let feeds = self.feeds().await?;

    let resolution = resolve_video_source(ResolveInput {
      session: session.as_ref(),
      video_override: video_override.as_ref(),
      schedules: &schedules,
      feeds: &feeds,
      now,
      grace: self.config.launch_grace,
    });

    if let Some(launch_id) = &resolution.newly_switched {
      match self.store.mark_switched(launch_id.clone()).await {
        Ok(_) => info!(%launch_id, "switched to scheduled launch feed"),
        Err(e) => warn!(%launch_id, error = %e, "failed to persist feed switch"),
      }
    }

    Ok(current_feed_from(resolution, &schedules, &feeds))
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn require_session(
    &self,
    session_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<MissionSession> {
    let session = self
      .store
      .get_session(session_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SessionNotFound(session_id))?;
    if session.is_expired(now) {
      return Err(Error::SessionExpired(session_id));
    }
    Ok(session)
  }

  async fn audit(&self, session_id: Uuid, update: NewUpdate) {
    let entry = update.into_update(session_id, Utc::now());
    if let Err(e) = self.store.insert_update(entry).await {
      warn!(%session_id, error = %e, "failed to write audit entry");
    }
  }
}

fn describe_patch(patch: &SessionPatch) -> String {
  let mut fields = Vec::new();
  if patch.mission_name.is_some() {
    fields.push("mission name");
  }
  if patch.launch_date.is_some() {
    fields.push("launch date");
  }
  if patch.live_stream_url.is_some() {
    fields.push("live stream url");
  }
  if patch.mission_patch_url.is_some() {
    fields.push("mission patch");
  }
  if let Some(live) = patch.is_live {
    fields.push(if live { "on air" } else { "off air" });
  }
  if let Some(enabled) = patch.iss_feed_enabled {
    fields.push(if enabled { "ISS feed enabled" } else { "ISS feed disabled" });
  }
  format!("Updated: {}", fields.join(", "))
}

fn current_feed_from(
  resolution: Resolution,
  schedules: &[LaunchFeedSchedule],
  feeds: &[IssLiveFeed],
) -> CurrentFeed {
  let feed = match resolution.source {
    VideoSource::DefaultFeed | VideoSource::IssBroadcast => default_feed(feeds).cloned(),
    VideoSource::Scheduled => resolution
      .launch
      .as_ref()
      .and_then(|l| schedules.iter().find(|s| s.launch_id == l.launch_id))
      .and_then(|s| s.feed_id)
      .and_then(|id| feeds.iter().find(|f| f.feed_id == id))
      .cloned(),
    VideoSource::Override | VideoSource::None => None,
  };

  CurrentFeed {
    feed,
    url: resolution.url,
    is_launch_feed: resolution.source == VideoSource::Scheduled,
    launch_info: resolution.launch,
  }
}
