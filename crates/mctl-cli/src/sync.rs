//! Polling sync client.
//!
//! A [`Syncer`] task owns the poll loop: it fetches a full [`Snapshot`] on
//! start and then once per interval, publishing each completed snapshot
//! through a [`watch`] channel. Subscribers only ever see whole snapshots.
//!
//! Within a cycle the session is fetched first; every other sub-resource is
//! then fetched concurrently. A failed sub-fetch is logged and the previous
//! value is kept, provided the active session has not changed since.

use std::{future::Future, sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use mctl_core::{
  feed::{IssLiveFeed, LaunchFeedSchedule},
  log::{MissionMilestone, MissionObjective, MissionUpdate, MissionWeather},
  overlay::{VideoOverlay, VideoOverride},
  resolve::{ResolveInput, Resolution, apply_switch, resolve_video_source},
  session::MissionSession,
};
use tokio::{
  sync::{oneshot, watch},
  task::JoinHandle,
  time::MissedTickBehavior,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::ApiClient;

// ─── Source ───────────────────────────────────────────────────────────────────

/// Where snapshots come from. Implemented by [`ApiClient`]; tests use an
/// in-memory fake.
pub trait SnapshotSource: Send + Sync + 'static {
  fn fetch_session(&self) -> impl Future<Output = Result<Option<MissionSession>>> + Send;

  fn fetch_updates(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MissionUpdate>>> + Send;

  fn fetch_milestones(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MissionMilestone>>> + Send;

  fn fetch_weather(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<MissionWeather>>> + Send;

  fn fetch_overlay(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<VideoOverlay>>> + Send;

  fn fetch_objectives(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MissionObjective>>> + Send;

  fn fetch_override(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<VideoOverride>>> + Send;

  fn fetch_feeds(&self) -> impl Future<Output = Result<Vec<IssLiveFeed>>> + Send;

  fn fetch_schedules(&self) -> impl Future<Output = Result<Vec<LaunchFeedSchedule>>> + Send;

  /// Persist the switch of a schedule entry this client selected first.
  fn mark_switched(&self, launch_id: String) -> impl Future<Output = Result<()>> + Send;
}

impl SnapshotSource for ApiClient {
  async fn fetch_session(&self) -> Result<Option<MissionSession>> {
    self.active_session().await
  }

  async fn fetch_updates(&self, session_id: Uuid) -> Result<Vec<MissionUpdate>> {
    self.updates(session_id).await
  }

  async fn fetch_milestones(&self, session_id: Uuid) -> Result<Vec<MissionMilestone>> {
    self.milestones(session_id).await
  }

  async fn fetch_weather(&self, session_id: Uuid) -> Result<Option<MissionWeather>> {
    self.latest_weather(session_id).await
  }

  async fn fetch_overlay(&self, session_id: Uuid) -> Result<Option<VideoOverlay>> {
    self.overlay(session_id).await
  }

  async fn fetch_objectives(&self, session_id: Uuid) -> Result<Vec<MissionObjective>> {
    self.objectives(session_id).await
  }

  async fn fetch_override(&self, session_id: Uuid) -> Result<Option<VideoOverride>> {
    self.video_override(session_id).await
  }

  async fn fetch_feeds(&self) -> Result<Vec<IssLiveFeed>> { self.feeds().await }

  async fn fetch_schedules(&self) -> Result<Vec<LaunchFeedSchedule>> { self.schedules().await }

  async fn mark_switched(&self, launch_id: String) -> Result<()> {
    ApiClient::mark_switched(self, &launch_id).await
  }
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

/// Everything a viewer renders, as of one poll cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  /// Number of completed cycles; `0` before the first fetch lands.
  pub cycle:          u64,
  pub fetched_at:     Option<DateTime<Utc>>,
  pub session:        Option<MissionSession>,
  pub updates:        Vec<MissionUpdate>,
  pub milestones:     Vec<MissionMilestone>,
  pub weather:        Option<MissionWeather>,
  pub overlay:        Option<VideoOverlay>,
  pub objectives:     Vec<MissionObjective>,
  pub video_override: Option<VideoOverride>,
  pub feeds:          Vec<IssLiveFeed>,
  pub schedules:      Vec<LaunchFeedSchedule>,
  /// Video source resolved at `fetched_at`.
  pub video:          Option<Resolution>,
  /// Sub-resources whose fetch failed this cycle.
  pub stale:          Vec<&'static str>,
}

impl Snapshot {
  pub fn session_id(&self) -> Option<Uuid> { self.session.as_ref().map(|s| s.session_id) }

  pub fn is_degraded(&self) -> bool { !self.stale.is_empty() }
}

/// Keep a sub-fetch result, or fall back to the previous cycle's value.
///
/// The fallback only applies while the session is unchanged; otherwise the
/// previous value belongs to another session and the default is used.
fn settle<T: Clone + Default>(
  name: &'static str,
  result: Result<T>,
  previous: &T,
  same_session: bool,
  stale: &mut Vec<&'static str>,
) -> T {
  match result {
    Ok(value) => value,
    Err(e) => {
      warn!(resource = name, error = %e, "sub-fetch failed; keeping previous value");
      stale.push(name);
      if same_session { previous.clone() } else { T::default() }
    }
  }
}

/// Run one full poll cycle against `source`, starting from `previous`.
pub async fn poll_once<S: SnapshotSource>(
  source: &S,
  previous: &Snapshot,
  grace: chrono::Duration,
) -> Snapshot {
  let mut stale = Vec::new();

  let session = settle(
    "session",
    source.fetch_session().await,
    &previous.session,
    true,
    &mut stale,
  );
  let same_session = session.as_ref().map(|s| s.session_id) == previous.session_id();

  let (feeds, schedules) = tokio::join!(source.fetch_feeds(), source.fetch_schedules());
  let feeds = settle("feeds", feeds, &previous.feeds, true, &mut stale);
  let mut schedules = settle("schedules", schedules, &previous.schedules, true, &mut stale);

  let mut next = Snapshot {
    cycle: previous.cycle + 1,
    fetched_at: Some(Utc::now()),
    ..Snapshot::default()
  };

  if let Some(id) = session.as_ref().map(|s| s.session_id) {
    let (updates, milestones, weather, overlay, objectives, video_override) = tokio::join!(
      source.fetch_updates(id),
      source.fetch_milestones(id),
      source.fetch_weather(id),
      source.fetch_overlay(id),
      source.fetch_objectives(id),
      source.fetch_override(id),
    );
    next.updates = settle("updates", updates, &previous.updates, same_session, &mut stale);
    next.milestones =
      settle("milestones", milestones, &previous.milestones, same_session, &mut stale);
    next.weather = settle("weather", weather, &previous.weather, same_session, &mut stale);
    next.overlay = settle("overlay", overlay, &previous.overlay, same_session, &mut stale);
    next.objectives =
      settle("objectives", objectives, &previous.objectives, same_session, &mut stale);
    next.video_override = settle(
      "override",
      video_override,
      &previous.video_override,
      same_session,
      &mut stale,
    );
  }

  let resolution = resolve_video_source(ResolveInput {
    session: session.as_ref(),
    video_override: next.video_override.as_ref(),
    schedules: &schedules,
    feeds: &feeds,
    now: next.fetched_at.unwrap_or_else(Utc::now),
    grace,
  });

  if let Some(launch_id) = &resolution.newly_switched {
    match source.mark_switched(launch_id.clone()).await {
      Ok(()) => info!(%launch_id, "switched to scheduled launch feed"),
      Err(e) => warn!(%launch_id, error = %e, "failed to persist feed switch"),
    }
    apply_switch(&mut schedules, &resolution);
  }

  next.session = session;
  next.feeds = feeds;
  next.schedules = schedules;
  next.video = Some(resolution);
  next.stale = stale;
  next
}

// ─── Poll loop ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
  Init,
  Polling,
  Stopped,
}

/// Poll loop settings.
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
  pub interval: Duration,
  pub grace:    chrono::Duration,
}

/// Handle to a running poll loop.
pub struct Syncer {
  snapshots: watch::Receiver<Snapshot>,
  phase:     watch::Receiver<SyncPhase>,
  stop:      oneshot::Sender<()>,
  task:      JoinHandle<()>,
}

impl Syncer {
  /// Start polling `source`. The first fetch begins immediately.
  pub fn spawn<S: SnapshotSource>(source: Arc<S>, config: SyncConfig) -> Self {
    let (snap_tx, snapshots) = watch::channel(Snapshot::default());
    let (phase_tx, phase) = watch::channel(SyncPhase::Init);
    let (stop, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(config.interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      phase_tx.send_replace(SyncPhase::Polling);
      debug!(interval = ?config.interval, "sync loop started");

      loop {
        tokio::select! {
          _ = &mut stop_rx => break,
          _ = ticker.tick() => {
            let previous = snap_tx.borrow().clone();
            tokio::select! {
              // A fetch still in flight at teardown is dropped unseen.
              _ = &mut stop_rx => break,
              next = poll_once(source.as_ref(), &previous, config.grace) => {
                snap_tx.send_replace(next);
              }
            }
          }
        }
      }

      phase_tx.send_replace(SyncPhase::Stopped);
      debug!("sync loop stopped");
    });

    Self { snapshots, phase, stop, task }
  }

  /// A receiver that observes every published snapshot.
  pub fn subscribe(&self) -> watch::Receiver<Snapshot> { self.snapshots.clone() }

  pub fn phase(&self) -> SyncPhase { *self.phase.borrow() }

  /// Tear down the loop and wait for it to exit.
  pub async fn stop(self) -> SyncPhase {
    let Self { mut phase, stop, task, .. } = self;
    let _ = stop.send(());
    if let Err(e) = task.await {
      warn!(error = %e, "sync task panicked");
    }
    *phase.borrow_and_update()
  }
}
