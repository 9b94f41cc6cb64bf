//! Mission sessions: the single broadcast record every viewer syncs against.
//!
//! At most one session is "active" at a time. A session is never reused for a
//! different mission: selecting a new mission supersedes the old session
//! entirely (see [`crate::store::SessionStore::supersede_session`]).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::log::NewMilestone;

/// Mission id reserved for the always-on ISS broadcast.
pub const ISS_MISSION_ID: &str = "iss-live";

/// How long a session stays active after creation unless superseded.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Persisted mission status, as set by the operator.
///
/// The dashboard may *display* `Live` for a mission whose persisted status is
/// still `Upcoming`; see [`crate::countdown::derive_countdown`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MissionStatus {
  Scheduled,
  Upcoming,
  Live,
  Completed,
  Failed,
  Delayed,
  Cancelled,
}

impl MissionStatus {
  /// Statuses for which a countdown is shown.
  pub fn counts_down(self) -> bool { matches!(self, Self::Scheduled | Self::Upcoming) }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// One logical broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSession {
  /// Opaque external key; never changes.
  pub session_id:        Uuid,
  pub mission_id:        String,
  pub mission_name:      String,
  pub agency:            String,
  pub launch_date:       DateTime<Utc>,
  pub status:            MissionStatus,
  pub vehicle:           String,
  pub payload:           String,
  pub destination:       String,
  pub launch_site:       String,
  /// Operator-supplied stream URL shown on the session card.
  pub live_stream_url:   Option<String>,
  pub mission_patch_url: Option<String>,
  /// Broadcast-is-on-air flag; independent of `status == live`.
  pub is_live:           bool,
  pub iss_feed_enabled:  bool,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
  pub expires_at:        DateTime<Utc>,
}

impl MissionSession {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }

  /// Whether this session is the always-on ISS broadcast.
  pub fn is_iss_broadcast(&self) -> bool { self.mission_id == ISS_MISSION_ID }

  /// Merge `patch` into `self` in place. Fields absent from the patch are
  /// left untouched.
  pub fn apply(&mut self, patch: &SessionPatch, now: DateTime<Utc>) {
    if let Some(v) = &patch.mission_name {
      self.mission_name = v.clone();
    }
    if let Some(v) = patch.launch_date {
      self.launch_date = v;
    }
    if let Some(v) = patch.status {
      self.status = v;
    }
    if let Some(v) = &patch.live_stream_url {
      self.live_stream_url = v.clone();
    }
    if let Some(v) = &patch.mission_patch_url {
      self.mission_patch_url = v.clone();
    }
    if let Some(v) = patch.is_live {
      self.is_live = v;
    }
    if let Some(v) = patch.iss_feed_enabled {
      self.iss_feed_enabled = v;
    }
    self.updated_at = now;
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::control::MissionControl::create_session`].
///
/// `session_id`, `is_live`, and all timestamps are assigned by the
/// coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
  pub mission_id:        String,
  pub mission_name:      String,
  #[serde(default)]
  pub agency:            String,
  pub launch_date:       DateTime<Utc>,
  pub status:            MissionStatus,
  #[serde(default)]
  pub vehicle:           String,
  #[serde(default)]
  pub payload:           String,
  #[serde(default)]
  pub destination:       String,
  #[serde(default)]
  pub launch_site:       String,
  #[serde(default)]
  pub live_stream_url:   Option<String>,
  #[serde(default)]
  pub mission_patch_url: Option<String>,
  #[serde(default = "default_true")]
  pub iss_feed_enabled:  bool,
  /// Mission-specific milestones; `None` seeds the default launch template.
  #[serde(default)]
  pub milestones:        Option<Vec<NewMilestone>>,
  #[serde(default)]
  pub objectives:        Vec<String>,
}

fn default_true() -> bool { true }

impl NewSession {
  /// The always-on ISS broadcast session.
  pub fn iss_broadcast(now: DateTime<Utc>) -> Self {
    Self {
      mission_id:        ISS_MISSION_ID.to_owned(),
      mission_name:      "ISS Live".to_owned(),
      agency:            "NASA".to_owned(),
      launch_date:       now,
      status:            MissionStatus::Live,
      vehicle:           String::new(),
      payload:           String::new(),
      destination:       "Low Earth Orbit".to_owned(),
      launch_site:       String::new(),
      live_stream_url:   None,
      mission_patch_url: None,
      iss_feed_enabled:  true,
      milestones:        Some(Vec::new()),
      objectives:        Vec::new(),
    }
  }

  /// Build the persisted session record.
  pub fn into_session(self, now: DateTime<Utc>, ttl: Duration) -> MissionSession {
    MissionSession {
      session_id:        Uuid::new_v4(),
      mission_id:        self.mission_id,
      mission_name:      self.mission_name,
      agency:            self.agency,
      launch_date:       self.launch_date,
      status:            self.status,
      vehicle:           self.vehicle,
      payload:           self.payload,
      destination:       self.destination,
      launch_site:       self.launch_site,
      live_stream_url:   self.live_stream_url,
      mission_patch_url: self.mission_patch_url,
      is_live:           false,
      iss_feed_enabled:  self.iss_feed_enabled,
      created_at:        now,
      updated_at:        now,
      expires_at:        now + ttl,
    }
  }
}

/// Partial update accepted by `updateSession`.
///
/// For the nullable URL fields, `Some(None)` clears the value while `None`
/// leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mission_name:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub launch_date:       Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status:            Option<MissionStatus>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    with = "double_option"
  )]
  pub live_stream_url:   Option<Option<String>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    with = "double_option"
  )]
  pub mission_patch_url: Option<Option<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_live:           Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iss_feed_enabled:  Option<bool>,
}

impl SessionPatch {
  pub fn is_empty(&self) -> bool {
    self.mission_name.is_none()
      && self.launch_date.is_none()
      && self.status.is_none()
      && self.live_stream_url.is_none()
      && self.mission_patch_url.is_none()
      && self.is_live.is_none()
      && self.iss_feed_enabled.is_none()
  }
}

/// Distinguishes an explicit JSON `null` from an absent field.
mod double_option {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  pub fn serialize<S: Serializer>(
    value: &Option<Option<String>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(inner) => inner.serialize(serializer),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<Option<String>>, D::Error> {
    Option::<String>::deserialize(deserializer).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn patch_distinguishes_null_from_absent() {
    let cleared: SessionPatch =
      serde_json::from_str(r#"{"liveStreamUrl":null}"#).unwrap();
    assert_eq!(cleared.live_stream_url, Some(None));

    let untouched: SessionPatch = serde_json::from_str(r#"{"status":"live"}"#).unwrap();
    assert_eq!(untouched.live_stream_url, None);
    assert_eq!(untouched.status, Some(MissionStatus::Live));
  }

  #[test]
  fn apply_merges_only_present_fields() {
    let now = Utc::now();
    let mut session = NewSession::iss_broadcast(now).into_session(now, Duration::hours(DEFAULT_SESSION_TTL_HOURS));
    session.live_stream_url = Some("https://example.com/a".into());

    let patch = SessionPatch {
      is_live: Some(true),
      ..Default::default()
    };
    session.apply(&patch, now);

    assert!(session.is_live);
    assert_eq!(session.live_stream_url.as_deref(), Some("https://example.com/a"));
    assert_eq!(session.status, MissionStatus::Live);
  }

  #[test]
  fn status_strings_match_wire_format() {
    assert_eq!(MissionStatus::Cancelled.to_string(), "cancelled");
    assert_eq!("upcoming".parse::<MissionStatus>().unwrap(), MissionStatus::Upcoming);
    assert!(MissionStatus::Scheduled.counts_down());
    assert!(!MissionStatus::Delayed.counts_down());
  }
}
