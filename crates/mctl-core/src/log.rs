//! Session sub-resources: the update log, milestones, weather samples and
//! objectives.
//!
//! Every record carries its owning `session_id` as a weak reference. Records
//! outlive the session that owns them; once a session is superseded they are
//! reachable only by that session's id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Updates ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UpdateType {
  #[default]
  General,
  Status,
  Milestone,
  Weather,
  Technical,
  /// Written by the coordinator itself as an audit trail.
  System,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Normal,
  High,
  Critical,
}

/// An append-only log entry. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionUpdate {
  pub id:          Uuid,
  pub session_id:  Uuid,
  pub update_type: UpdateType,
  pub title:       String,
  pub content:     String,
  pub author:      String,
  pub priority:    Priority,
  pub is_public:   bool,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUpdate {
  #[serde(default)]
  pub update_type: UpdateType,
  pub title:       String,
  pub content:     String,
  pub author:      String,
  #[serde(default)]
  pub priority:    Priority,
  #[serde(default = "default_public")]
  pub is_public:   bool,
}

fn default_public() -> bool { true }

impl NewUpdate {
  /// Audit entry authored by the coordinator.
  pub fn system(title: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      update_type: UpdateType::System,
      title:       title.into(),
      content:     content.into(),
      author:      "Mission Control".to_owned(),
      priority:    Priority::Normal,
      is_public:   true,
    }
  }

  /// `title`, `content` and `author` are required; nothing else is checked.
  pub fn validate(&self) -> Result<()> {
    for (field, value) in [
      ("title", &self.title),
      ("content", &self.content),
      ("author", &self.author),
    ] {
      if value.trim().is_empty() {
        return Err(Error::Validation(format!("update {field} is required")));
      }
    }
    Ok(())
  }

  pub fn into_update(self, session_id: Uuid, now: DateTime<Utc>) -> MissionUpdate {
    MissionUpdate {
      id: Uuid::new_v4(),
      session_id,
      update_type: self.update_type,
      title: self.title,
      content: self.content,
      author: self.author,
      priority: self.priority,
      is_public: self.is_public,
      created_at: now,
    }
  }
}

// ─── Milestones ──────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MilestoneStatus {
  #[default]
  Upcoming,
  Current,
  Completed,
  Failed,
}

/// A step in the mission timeline. Only `status` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionMilestone {
  pub id:          Uuid,
  pub session_id:  Uuid,
  pub name:        String,
  /// Display offset relative to launch, e.g. `T-00:30:00`.
  pub time_offset: String,
  pub status:      MilestoneStatus,
  pub description: String,
  pub sort_order:  i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
  pub name:        String,
  pub time_offset: String,
  #[serde(default)]
  pub status:      MilestoneStatus,
  #[serde(default)]
  pub description: String,
  pub sort_order:  i64,
}

impl NewMilestone {
  pub fn new(sort_order: i64, name: &str, time_offset: &str, description: &str) -> Self {
    Self {
      name: name.to_owned(),
      time_offset: time_offset.to_owned(),
      status: MilestoneStatus::Upcoming,
      description: description.to_owned(),
      sort_order,
    }
  }

  pub fn into_milestone(self, session_id: Uuid) -> MissionMilestone {
    MissionMilestone {
      id: Uuid::new_v4(),
      session_id,
      name: self.name,
      time_offset: self.time_offset,
      status: self.status,
      description: self.description,
      sort_order: self.sort_order,
    }
  }
}

/// Milestones seeded for a launch when the operator supplies none.
pub fn default_milestones() -> Vec<NewMilestone> {
  vec![
    NewMilestone::new(1, "Launch Director Poll", "T-00:45:00", "Final go/no-go poll of all stations"),
    NewMilestone::new(2, "Terminal Count", "T-00:10:00", "Automated launch sequencer takes over"),
    NewMilestone::new(3, "Liftoff", "T-00:00:00", "Vehicle clears the tower"),
    NewMilestone::new(4, "Max-Q", "T+00:01:12", "Maximum aerodynamic pressure"),
    NewMilestone::new(5, "MECO", "T+00:02:30", "Main engine cutoff"),
    NewMilestone::new(6, "Stage Separation", "T+00:02:35", "First stage separates"),
    NewMilestone::new(7, "Payload Deploy", "T+01:00:00", "Payload separation confirmed"),
  ]
}

// ─── Weather ─────────────────────────────────────────────────────────────────

/// Tri-state launch-readiness verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum GoNoGo {
  #[serde(rename = "GO")]
  #[strum(serialize = "GO")]
  Go,
  #[serde(rename = "NO-GO")]
  #[strum(serialize = "NO-GO")]
  NoGo,
  #[serde(rename = "CONDITIONAL")]
  #[strum(serialize = "CONDITIONAL")]
  Conditional,
}

/// One weather sample. Only the latest sample per session is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionWeather {
  pub id:             Uuid,
  pub session_id:     Uuid,
  pub temperature:    f64,
  pub wind_speed:     f64,
  pub wind_direction: String,
  pub visibility:     f64,
  pub humidity:       f64,
  pub conditions:     String,
  pub go_no_go:       GoNoGo,
  pub source:         String,
  pub recorded_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWeather {
  pub temperature:    f64,
  pub wind_speed:     f64,
  #[serde(default)]
  pub wind_direction: String,
  pub visibility:     f64,
  pub humidity:       f64,
  #[serde(default)]
  pub conditions:     String,
  pub go_no_go:       GoNoGo,
  #[serde(default)]
  pub source:         String,
  /// Defaults to the time the sample is stored.
  #[serde(default)]
  pub recorded_at:    Option<DateTime<Utc>>,
}

impl NewWeather {
  pub fn into_weather(self, session_id: Uuid, now: DateTime<Utc>) -> MissionWeather {
    MissionWeather {
      id: Uuid::new_v4(),
      session_id,
      temperature: self.temperature,
      wind_speed: self.wind_speed,
      wind_direction: self.wind_direction,
      visibility: self.visibility,
      humidity: self.humidity,
      conditions: self.conditions,
      go_no_go: self.go_no_go,
      source: self.source,
      recorded_at: self.recorded_at.unwrap_or(now),
    }
  }
}

// ─── Objectives ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionObjective {
  pub session_id: Uuid,
  pub objective:  String,
  pub sort_order: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn go_no_go_uses_upper_case_wire_names() {
    assert_eq!(serde_json::to_string(&GoNoGo::NoGo).unwrap(), "\"NO-GO\"");
    assert_eq!("CONDITIONAL".parse::<GoNoGo>().unwrap(), GoNoGo::Conditional);
    assert_eq!(GoNoGo::Go.to_string(), "GO");
  }

  #[test]
  fn update_requires_title_content_and_author() {
    let mut update = NewUpdate::system("T-10", "Terminal count started");
    assert!(update.validate().is_ok());

    update.author = "  ".into();
    let err = update.validate().unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Validation);
  }

  #[test]
  fn default_template_is_sorted() {
    let template = default_milestones();
    assert!(template.windows(2).all(|w| w[0].sort_order < w[1].sort_order));
    assert!(template.iter().all(|m| m.status == MilestoneStatus::Upcoming));
  }
}
