//! Application state and key dispatcher for the live dashboard.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mctl_core::{
  countdown::{Countdown, derive_countdown},
  overlay::Overlay,
};
use tokio::sync::watch;

use crate::sync::Snapshot;

// ─── Tab ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  /// Session details, countdown, weather, video, objectives.
  Overview,
  /// Milestones in sequence.
  Timeline,
  /// Mission updates, newest first.
  Log,
}

impl Tab {
  pub const ALL: [Tab; 3] = [Tab::Overview, Tab::Timeline, Tab::Log];

  pub fn title(self) -> &'static str {
    match self {
      Tab::Overview => "Overview",
      Tab::Timeline => "Timeline",
      Tab::Log => "Log",
    }
  }

  fn next(self) -> Self {
    match self {
      Tab::Overview => Tab::Timeline,
      Tab::Timeline => Tab::Log,
      Tab::Log => Tab::Overview,
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level dashboard state.
pub struct App {
  pub tab: Tab,

  /// Last snapshot taken from the sync loop. Rendering only reads this.
  pub snapshot: Snapshot,

  /// Scroll offset within the update log.
  pub log_scroll: usize,

  /// Scroll offset within the milestone timeline.
  pub timeline_scroll: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  snapshots: watch::Receiver<Snapshot>,
}

impl App {
  pub fn new(snapshots: watch::Receiver<Snapshot>) -> Self {
    let snapshot = snapshots.borrow().clone();
    Self {
      tab: Tab::Overview,
      snapshot,
      log_scroll: 0,
      timeline_scroll: 0,
      status_msg: String::new(),
      snapshots,
    }
  }

  // ── Data ──────────────────────────────────────────────────────────────────

  /// Take the latest published snapshot, if a new one arrived. Returns
  /// whether anything changed.
  pub fn refresh(&mut self) -> bool {
    if !matches!(self.snapshots.has_changed(), Ok(true)) {
      return false;
    }
    let next = self.snapshots.borrow_and_update().clone();

    // A new session starts the views from the top.
    if next.session_id() != self.snapshot.session_id() {
      self.log_scroll = 0;
      self.timeline_scroll = 0;
    }
    self.snapshot = next;
    self.log_scroll = clamp(self.log_scroll, self.snapshot.updates.len());
    self.timeline_scroll = clamp(self.timeline_scroll, self.snapshot.milestones.len());

    self.status_msg = if self.snapshot.is_degraded() {
      format!("Stale: {}", self.snapshot.stale.join(", "))
    } else {
      String::new()
    };
    true
  }

  /// Countdown for the active session as of `now`.
  pub fn countdown(&self, now: DateTime<Utc>) -> Option<Countdown> {
    self
      .snapshot
      .session
      .as_ref()
      .map(|s| derive_countdown(s.launch_date, s.status, now))
  }

  /// The overlay banner to show, if one is up.
  pub fn banner(&self) -> Option<&Overlay> {
    self
      .snapshot
      .overlay
      .as_ref()
      .filter(|o| o.is_active)
      .map(|o| &o.overlay)
      .filter(|o| o.is_visible())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => return false,

      KeyCode::Tab => self.tab = self.tab.next(),
      KeyCode::Char('1') => self.tab = Tab::Overview,
      KeyCode::Char('2') => self.tab = Tab::Timeline,
      KeyCode::Char('3') => self.tab = Tab::Log,

      KeyCode::Down | KeyCode::Char('j') => self.scroll(1),
      KeyCode::Up | KeyCode::Char('k') => self.scroll(-1),
      KeyCode::Home | KeyCode::Char('g') => self.scroll(isize::MIN),

      _ => {}
    }
    true
  }

  fn scroll(&mut self, delta: isize) {
    let (offset, len) = match self.tab {
      Tab::Overview => return,
      Tab::Timeline => (&mut self.timeline_scroll, self.snapshot.milestones.len()),
      Tab::Log => (&mut self.log_scroll, self.snapshot.updates.len()),
    };
    *offset = clamp(offset.saturating_add_signed(delta), len);
  }
}

fn clamp(offset: usize, len: usize) -> usize { offset.min(len.saturating_sub(1)) }

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use mctl_core::{
    log::NewUpdate,
    overlay::VideoOverlay,
    session::{MissionStatus, NewSession},
  };

  use super::*;

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  fn snapshot_with_updates(n: usize) -> Snapshot {
    let now = Utc::now();
    let session = NewSession::iss_broadcast(now).into_session(now, Duration::hours(24));
    let updates = (0..n)
      .map(|i| NewUpdate::system(format!("update {i}"), "").into_update(session.session_id, now))
      .collect();
    Snapshot {
      cycle: 1,
      session: Some(session),
      updates,
      ..Snapshot::default()
    }
  }

  #[test]
  fn quits_on_q_and_ctrl_c() {
    let (_tx, rx) = watch::channel(Snapshot::default());
    let mut app = App::new(rx);
    assert!(!app.handle_key(key(KeyCode::Char('q'))));
    assert!(!app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    assert!(app.handle_key(key(KeyCode::Char('x'))));
  }

  #[test]
  fn tab_cycles_and_digits_jump() {
    let (_tx, rx) = watch::channel(Snapshot::default());
    let mut app = App::new(rx);
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.tab, Tab::Timeline);
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.tab, Tab::Overview);
    app.handle_key(key(KeyCode::Char('3')));
    assert_eq!(app.tab, Tab::Log);
  }

  #[test]
  fn refresh_takes_new_snapshot_and_clamps_scroll() {
    let (tx, rx) = watch::channel(Snapshot::default());
    let mut app = App::new(rx);
    assert!(!app.refresh());

    tx.send_replace(snapshot_with_updates(3));
    assert!(app.refresh());
    assert_eq!(app.snapshot.updates.len(), 3);

    app.tab = Tab::Log;
    for _ in 0..10 {
      app.handle_key(key(KeyCode::Char('j')));
    }
    assert_eq!(app.log_scroll, 2);

    let mut shorter = app.snapshot.clone();
    shorter.updates.truncate(1);
    tx.send_replace(shorter);
    assert!(app.refresh());
    assert_eq!(app.log_scroll, 0);
  }

  #[test]
  fn stale_resources_show_in_status() {
    let (tx, rx) = watch::channel(Snapshot::default());
    let mut app = App::new(rx);
    let mut snap = snapshot_with_updates(0);
    snap.stale = vec!["weather", "overlay"];
    tx.send_replace(snap);
    app.refresh();
    assert_eq!(app.status_msg, "Stale: weather, overlay");
  }

  #[test]
  fn countdown_follows_session() {
    let (tx, rx) = watch::channel(Snapshot::default());
    let mut app = App::new(rx);
    let now = Utc::now();
    assert!(app.countdown(now).is_none());

    let mut snap = snapshot_with_updates(0);
    if let Some(s) = snap.session.as_mut() {
      s.status = MissionStatus::Upcoming;
      s.launch_date = now + Duration::seconds(90);
    }
    tx.send_replace(snap);
    app.refresh();
    let countdown = app.countdown(now).unwrap();
    assert_eq!((countdown.minutes, countdown.seconds), (1, 30));
  }

  #[test]
  fn banner_hidden_for_none_overlay() {
    let (_tx, rx) = watch::channel(Snapshot::default());
    let mut app = App::new(rx);
    let id = uuid::Uuid::new_v4();
    app.snapshot.overlay = Some(VideoOverlay::new(id, Overlay::None, Utc::now()));
    assert!(app.banner().is_none());

    app.snapshot.overlay = Some(VideoOverlay::new(id, Overlay::Maintenance, Utc::now()));
    assert_eq!(app.banner().map(Overlay::headline), Some("Maintenance"));
  }
}
