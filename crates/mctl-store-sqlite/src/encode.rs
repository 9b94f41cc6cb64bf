//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order is chronological order. Enums
//! are stored as their wire strings. UUIDs are stored hyphenated lowercase.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use mctl_core::{
  feed::{IssLiveFeed, LaunchFeedSchedule},
  log::{MissionMilestone, MissionUpdate, MissionWeather},
  overlay::{Overlay, VideoOverlay, VideoOverride},
  session::MissionSession,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse a stored enum column via its `FromStr` (strum) implementation.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue {
    column,
    value: s.to_owned(),
  })
}

// ─── Sessions ────────────────────────────────────────────────────────────────

pub const SESSION_COLUMNS: &str = "session_id, mission_id, mission_name, agency, \
  launch_date, status, vehicle, payload, destination, launch_site, live_stream_url, \
  mission_patch_url, is_live, iss_feed_enabled, created_at, updated_at, expires_at";

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub session_id:        String,
  pub mission_id:        String,
  pub mission_name:      String,
  pub agency:            String,
  pub launch_date:       String,
  pub status:            String,
  pub vehicle:           String,
  pub payload:           String,
  pub destination:       String,
  pub launch_site:       String,
  pub live_stream_url:   Option<String>,
  pub mission_patch_url: Option<String>,
  pub is_live:           bool,
  pub iss_feed_enabled:  bool,
  pub created_at:        String,
  pub updated_at:        String,
  pub expires_at:        String,
}

impl RawSession {
  /// Map a row selected with [`SESSION_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:        row.get(0)?,
      mission_id:        row.get(1)?,
      mission_name:      row.get(2)?,
      agency:            row.get(3)?,
      launch_date:       row.get(4)?,
      status:            row.get(5)?,
      vehicle:           row.get(6)?,
      payload:           row.get(7)?,
      destination:       row.get(8)?,
      launch_site:       row.get(9)?,
      live_stream_url:   row.get(10)?,
      mission_patch_url: row.get(11)?,
      is_live:           row.get(12)?,
      iss_feed_enabled:  row.get(13)?,
      created_at:        row.get(14)?,
      updated_at:        row.get(15)?,
      expires_at:        row.get(16)?,
    })
  }

  pub fn into_session(self) -> Result<MissionSession> {
    Ok(MissionSession {
      session_id:        decode_uuid(&self.session_id)?,
      mission_id:        self.mission_id,
      mission_name:      self.mission_name,
      agency:            self.agency,
      launch_date:       decode_dt(&self.launch_date)?,
      status:            decode_enum("sessions.status", &self.status)?,
      vehicle:           self.vehicle,
      payload:           self.payload,
      destination:       self.destination,
      launch_site:       self.launch_site,
      live_stream_url:   self.live_stream_url,
      mission_patch_url: self.mission_patch_url,
      is_live:           self.is_live,
      iss_feed_enabled:  self.iss_feed_enabled,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
      expires_at:        decode_dt(&self.expires_at)?,
    })
  }
}

// ─── Updates ─────────────────────────────────────────────────────────────────

pub struct RawUpdate {
  pub id:          String,
  pub session_id:  String,
  pub update_type: String,
  pub title:       String,
  pub content:     String,
  pub author:      String,
  pub priority:    String,
  pub is_public:   bool,
  pub created_at:  String,
}

impl RawUpdate {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      session_id:  row.get(1)?,
      update_type: row.get(2)?,
      title:       row.get(3)?,
      content:     row.get(4)?,
      author:      row.get(5)?,
      priority:    row.get(6)?,
      is_public:   row.get(7)?,
      created_at:  row.get(8)?,
    })
  }

  pub fn into_update(self) -> Result<MissionUpdate> {
    Ok(MissionUpdate {
      id:          decode_uuid(&self.id)?,
      session_id:  decode_uuid(&self.session_id)?,
      update_type: decode_enum("mission_updates.update_type", &self.update_type)?,
      title:       self.title,
      content:     self.content,
      author:      self.author,
      priority:    decode_enum("mission_updates.priority", &self.priority)?,
      is_public:   self.is_public,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Milestones ──────────────────────────────────────────────────────────────

pub struct RawMilestone {
  pub id:          String,
  pub session_id:  String,
  pub name:        String,
  pub time_offset: String,
  pub status:      String,
  pub description: String,
  pub sort_order:  i64,
}

impl RawMilestone {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      session_id:  row.get(1)?,
      name:        row.get(2)?,
      time_offset: row.get(3)?,
      status:      row.get(4)?,
      description: row.get(5)?,
      sort_order:  row.get(6)?,
    })
  }

  pub fn into_milestone(self) -> Result<MissionMilestone> {
    Ok(MissionMilestone {
      id:          decode_uuid(&self.id)?,
      session_id:  decode_uuid(&self.session_id)?,
      name:        self.name,
      time_offset: self.time_offset,
      status:      decode_enum("milestones.status", &self.status)?,
      description: self.description,
      sort_order:  self.sort_order,
    })
  }
}

// ─── Weather ─────────────────────────────────────────────────────────────────

pub struct RawWeather {
  pub id:             String,
  pub session_id:     String,
  pub temperature:    f64,
  pub wind_speed:     f64,
  pub wind_direction: String,
  pub visibility:     f64,
  pub humidity:       f64,
  pub conditions:     String,
  pub go_no_go:       String,
  pub source:         String,
  pub recorded_at:    String,
}

impl RawWeather {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      session_id:     row.get(1)?,
      temperature:    row.get(2)?,
      wind_speed:     row.get(3)?,
      wind_direction: row.get(4)?,
      visibility:     row.get(5)?,
      humidity:       row.get(6)?,
      conditions:     row.get(7)?,
      go_no_go:       row.get(8)?,
      source:         row.get(9)?,
      recorded_at:    row.get(10)?,
    })
  }

  pub fn into_weather(self) -> Result<MissionWeather> {
    Ok(MissionWeather {
      id:             decode_uuid(&self.id)?,
      session_id:     decode_uuid(&self.session_id)?,
      temperature:    self.temperature,
      wind_speed:     self.wind_speed,
      wind_direction: self.wind_direction,
      visibility:     self.visibility,
      humidity:       self.humidity,
      conditions:     self.conditions,
      go_no_go:       decode_enum("weather.go_no_go", &self.go_no_go)?,
      source:         self.source,
      recorded_at:    decode_dt(&self.recorded_at)?,
    })
  }
}

// ─── Overlay / override ──────────────────────────────────────────────────────

pub struct RawOverlay {
  pub session_id:   String,
  pub overlay_type: String,
  pub custom_text:  Option<String>,
  pub is_active:    bool,
  pub updated_at:   String,
}

impl RawOverlay {
  pub fn into_overlay(self) -> Result<VideoOverlay> {
    let kind = decode_enum("video_overlays.overlay_type", &self.overlay_type)?;
    Ok(VideoOverlay {
      session_id: decode_uuid(&self.session_id)?,
      overlay:    Overlay::from_parts(kind, self.custom_text)?,
      is_active:  self.is_active,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawOverride {
  pub session_id: String,
  pub url:        Option<String>,
  pub is_active:  bool,
  pub updated_at: String,
}

impl RawOverride {
  pub fn into_override(self) -> Result<VideoOverride> {
    Ok(VideoOverride {
      session_id: decode_uuid(&self.session_id)?,
      url:        self.url,
      is_active:  self.is_active,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Catalogue ───────────────────────────────────────────────────────────────

pub struct RawFeed {
  pub feed_id:     String,
  pub title:       String,
  pub youtube_url: Option<String>,
  pub embed_url:   String,
  pub is_active:   bool,
  pub is_default:  bool,
  pub priority:    i64,
}

impl RawFeed {
  pub fn into_feed(self) -> Result<IssLiveFeed> {
    Ok(IssLiveFeed {
      feed_id:     decode_uuid(&self.feed_id)?,
      title:       self.title,
      youtube_url: self.youtube_url,
      embed_url:   self.embed_url,
      is_active:   self.is_active,
      is_default:  self.is_default,
      priority:    self.priority,
    })
  }
}

pub const SCHEDULE_COLUMNS: &str = "launch_id, launch_name, launch_date, feed_url, \
  feed_id, switch_time_minutes, is_switched";

pub struct RawSchedule {
  pub launch_id:           String,
  pub launch_name:         String,
  pub launch_date:         String,
  pub feed_url:            Option<String>,
  pub feed_id:             Option<String>,
  pub switch_time_minutes: i64,
  pub is_switched:         bool,
}

impl RawSchedule {
  /// Map a row selected with [`SCHEDULE_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      launch_id:           row.get(0)?,
      launch_name:         row.get(1)?,
      launch_date:         row.get(2)?,
      feed_url:            row.get(3)?,
      feed_id:             row.get(4)?,
      switch_time_minutes: row.get(5)?,
      is_switched:         row.get(6)?,
    })
  }

  pub fn into_schedule(self) -> Result<LaunchFeedSchedule> {
    Ok(LaunchFeedSchedule {
      launch_id:           self.launch_id,
      launch_name:         self.launch_name,
      launch_date:         decode_dt(&self.launch_date)?,
      feed_url:            self.feed_url,
      feed_id:             self.feed_id.as_deref().map(decode_uuid).transpose()?,
      switch_time_minutes: self.switch_time_minutes,
      is_switched:         self.is_switched,
    })
  }
}
