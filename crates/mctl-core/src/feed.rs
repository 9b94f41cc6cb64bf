//! Launch catalogue entries: live video feeds and launch feed schedules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest lead time a schedule entry may switch ahead of its launch (one week).
pub const MAX_SWITCH_TIME_MINUTES: i64 = 7 * 24 * 60;

/// Embed used for the ISS broadcast when the catalogue has no default feed.
pub const FALLBACK_ISS_EMBED_URL: &str = "https://www.youtube.com/embed/P9C25Un7xaM";

/// A playable live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssLiveFeed {
  pub feed_id:     Uuid,
  pub title:       String,
  pub youtube_url: Option<String>,
  pub embed_url:   String,
  pub is_active:   bool,
  pub is_default:  bool,
  /// Higher wins when several default feeds are active.
  pub priority:    i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeed {
  pub title:       String,
  #[serde(default)]
  pub youtube_url: Option<String>,
  pub embed_url:   String,
  #[serde(default = "default_true")]
  pub is_active:   bool,
  #[serde(default)]
  pub is_default:  bool,
  #[serde(default)]
  pub priority:    i64,
}

fn default_true() -> bool { true }

impl NewFeed {
  pub fn into_feed(self) -> IssLiveFeed {
    IssLiveFeed {
      feed_id:     Uuid::new_v4(),
      title:       self.title,
      youtube_url: self.youtube_url,
      embed_url:   self.embed_url,
      is_active:   self.is_active,
      is_default:  self.is_default,
      priority:    self.priority,
    }
  }
}

/// Pick the default feed: active, flagged default, highest priority.
pub fn default_feed(feeds: &[IssLiveFeed]) -> Option<&IssLiveFeed> {
  feeds
    .iter()
    .filter(|f| f.is_active && f.is_default)
    .max_by_key(|f| f.priority)
}

/// A launch whose coverage should replace the default feed shortly before
/// liftoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchFeedSchedule {
  pub launch_id:           String,
  pub launch_name:         String,
  pub launch_date:         DateTime<Utc>,
  /// Direct stream URL for this launch; wins over `feed_id`.
  pub feed_url:            Option<String>,
  /// A catalogue feed to play instead of a direct URL.
  pub feed_id:             Option<Uuid>,
  pub switch_time_minutes: i64,
  /// Set the first time a resolution pass selects this entry; never cleared.
  pub is_switched:         bool,
}

impl LaunchFeedSchedule {
  /// `launch_date - switch_time_minutes <= now < launch_date + grace`.
  ///
  /// A bound that falls outside the representable range puts the entry
  /// outside its window.
  pub fn in_window(&self, now: DateTime<Utc>, grace: Duration) -> bool {
    let opens = Duration::try_minutes(self.switch_time_minutes)
      .and_then(|lead| self.launch_date.checked_sub_signed(lead));
    let closes = self.launch_date.checked_add_signed(grace);
    match (opens, closes) {
      (Some(opens), Some(closes)) => opens <= now && now < closes,
      _ => false,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
  pub launch_id:           String,
  pub launch_name:         String,
  pub launch_date:         DateTime<Utc>,
  #[serde(default)]
  pub feed_url:            Option<String>,
  #[serde(default)]
  pub feed_id:             Option<Uuid>,
  pub switch_time_minutes: i64,
}

impl NewSchedule {
  pub fn into_schedule(self) -> LaunchFeedSchedule {
    LaunchFeedSchedule {
      launch_id:           self.launch_id,
      launch_name:         self.launch_name,
      launch_date:         self.launch_date,
      feed_url:            self.feed_url,
      feed_id:             self.feed_id,
      switch_time_minutes: self.switch_time_minutes,
      is_switched:         false,
    }
  }
}

/// Launch details attached to a [`CurrentFeed`] when a schedule entry won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchInfo {
  pub launch_id:   String,
  pub launch_name: String,
  pub launch_date: DateTime<Utc>,
}

/// Response of `GET iss-feed/current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentFeed {
  pub feed:           Option<IssLiveFeed>,
  pub url:            Option<String>,
  pub is_launch_feed: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub launch_info:    Option<LaunchInfo>,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn entry(switch_time_minutes: i64) -> LaunchFeedSchedule {
    NewSchedule {
      launch_id: "crew-12".into(),
      launch_name: "Crew-12".into(),
      launch_date: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
      feed_url: Some("https://embed.example/crew-12".into()),
      feed_id: None,
      switch_time_minutes,
    }
    .into_schedule()
  }

  #[test]
  fn window_bounds() {
    let e = entry(30);
    let grace = Duration::minutes(60);
    assert!(!e.in_window(e.launch_date - Duration::minutes(31), grace));
    assert!(e.in_window(e.launch_date - Duration::minutes(30), grace));
    assert!(e.in_window(e.launch_date + Duration::minutes(59), grace));
    assert!(!e.in_window(e.launch_date + Duration::minutes(60), grace));
  }

  #[test]
  fn unrepresentable_window_is_closed() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 11, 0, 0).unwrap();
    let grace = Duration::minutes(60);
    assert!(!entry(9_000_000_000_000).in_window(now, grace));
    assert!(!entry(i64::MAX).in_window(now, grace));
    assert!(!entry(30).in_window(now, Duration::MAX));
  }
}
