//! Video source resolution.
//!
//! [`resolve_video_source`] is a pure function evaluated independently by
//! every viewer on every poll (and by the server for `GET iss-feed/current`).
//! Precedence, highest first:
//!
//! 1. an active operator override,
//! 2. the ISS broadcast session's own feed,
//! 3. a launch feed schedule inside its switch window,
//! 4. the default ISS feed, when the session allows it,
//! 5. nothing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  feed::{
    FALLBACK_ISS_EMBED_URL, IssLiveFeed, LaunchFeedSchedule, LaunchInfo, default_feed,
  },
  overlay::VideoOverride,
  session::MissionSession,
};

/// How long after `launch_date` a schedule entry keeps its feed.
pub const DEFAULT_LAUNCH_GRACE_MINUTES: i64 = 60;

/// Upper bound accepted for a configured grace period (one week).
pub const MAX_LAUNCH_GRACE_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoSource {
  Override,
  IssBroadcast,
  Scheduled,
  DefaultFeed,
  None,
}

/// Everything the resolver looks at for one pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
  /// `None` when there is no active session; the default feed is then
  /// allowed.
  pub session:        Option<&'a MissionSession>,
  pub video_override: Option<&'a VideoOverride>,
  pub schedules:      &'a [LaunchFeedSchedule],
  pub feeds:          &'a [IssLiveFeed],
  pub now:            DateTime<Utc>,
  pub grace:          Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
  pub source:         VideoSource,
  pub url:            Option<String>,
  pub launch:         Option<LaunchInfo>,
  /// Launch id of a schedule entry selected for the first time. The caller
  /// persists the switch; resolving again after that yields `None` here.
  pub newly_switched: Option<String>,
}

impl Resolution {
  fn none() -> Self {
    Self {
      source:         VideoSource::None,
      url:            None,
      launch:         None,
      newly_switched: None,
    }
  }

  fn simple(source: VideoSource, url: String) -> Self {
    Self {
      source,
      url: Some(url),
      launch: None,
      newly_switched: None,
    }
  }

  pub fn is_playable(&self) -> bool { self.url.is_some() }
}

pub fn resolve_video_source(input: ResolveInput<'_>) -> Resolution {
  if let Some(url) = input.video_override.and_then(VideoOverride::active_url) {
    return Resolution::simple(VideoSource::Override, url.to_owned());
  }

  let default = default_feed(input.feeds);

  if input.session.is_some_and(MissionSession::is_iss_broadcast) {
    let url = default
      .map(|f| f.embed_url.clone())
      .unwrap_or_else(|| FALLBACK_ISS_EMBED_URL.to_owned());
    return Resolution::simple(VideoSource::IssBroadcast, url);
  }

  if let Some((entry, url)) = pick_schedule(&input) {
    return Resolution {
      source:         VideoSource::Scheduled,
      url:            Some(url),
      launch:         Some(LaunchInfo {
        launch_id:   entry.launch_id.clone(),
        launch_name: entry.launch_name.clone(),
        launch_date: entry.launch_date,
      }),
      newly_switched: (!entry.is_switched).then(|| entry.launch_id.clone()),
    };
  }

  let iss_enabled = input.session.is_none_or(|s| s.iss_feed_enabled);
  match default {
    Some(feed) if iss_enabled => {
      Resolution::simple(VideoSource::DefaultFeed, feed.embed_url.clone())
    }
    _ => Resolution::none(),
  }
}

/// Among entries inside their switch window with a playable URL, prefer the
/// nearest upcoming launch, then the most recent one still inside its grace
/// period.
fn pick_schedule<'a>(
  input: &ResolveInput<'a>,
) -> Option<(&'a LaunchFeedSchedule, String)> {
  input
    .schedules
    .iter()
    .filter(|s| s.in_window(input.now, input.grace))
    .filter_map(|s| schedule_url(s, input.feeds).map(|url| (s, url)))
    .min_by_key(|(s, _)| {
      let already_launched = s.launch_date < input.now;
      (already_launched, (s.launch_date - input.now).abs())
    })
}

fn schedule_url(entry: &LaunchFeedSchedule, feeds: &[IssLiveFeed]) -> Option<String> {
  if let Some(url) = entry.feed_url.as_deref().filter(|u| !u.trim().is_empty()) {
    return Some(url.to_owned());
  }
  let feed_id = entry.feed_id?;
  feeds
    .iter()
    .find(|f| f.feed_id == feed_id && f.is_active)
    .map(|f| f.embed_url.clone())
}

/// Record a resolution's switch on a local copy of the schedule list.
///
/// Only ever sets `is_switched`; an entry that has switched stays switched.
pub fn apply_switch(schedules: &mut [LaunchFeedSchedule], resolution: &Resolution) {
  if let Some(launch_id) = &resolution.newly_switched {
    for entry in schedules.iter_mut().filter(|s| &s.launch_id == launch_id) {
      entry.is_switched = true;
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use uuid::Uuid;

  use super::*;
  use crate::session::{ISS_MISSION_ID, MissionStatus, NewSession};

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() }

  fn grace() -> Duration { Duration::minutes(DEFAULT_LAUNCH_GRACE_MINUTES) }

  fn session(mission_id: &str, iss_feed_enabled: bool) -> MissionSession {
    let mut spec = NewSession::iss_broadcast(now());
    spec.mission_id = mission_id.into();
    spec.status = MissionStatus::Upcoming;
    spec.iss_feed_enabled = iss_feed_enabled;
    spec.into_session(now(), Duration::hours(24))
  }

  fn iss_feed() -> IssLiveFeed {
    IssLiveFeed {
      feed_id:     Uuid::new_v4(),
      title:       "ISS HD Earth Viewing".into(),
      youtube_url: None,
      embed_url:   "https://embed.example/iss".into(),
      is_active:   true,
      is_default:  true,
      priority:    1,
    }
  }

  fn schedule(launch_id: &str, in_minutes: i64, switch_minutes: i64) -> LaunchFeedSchedule {
    LaunchFeedSchedule {
      launch_id:           launch_id.into(),
      launch_name:         format!("Launch {launch_id}"),
      launch_date:         now() + Duration::minutes(in_minutes),
      feed_url:            Some(format!("https://embed.example/{launch_id}")),
      feed_id:             None,
      switch_time_minutes: switch_minutes,
      is_switched:         false,
    }
  }

  fn override_on(url: &str) -> VideoOverride {
    VideoOverride::new(Uuid::nil(), Some(url.into()), true, now()).unwrap()
  }

  #[test]
  fn override_beats_everything() {
    let s = session("artemis-2", true);
    let feeds = [iss_feed()];
    let schedules = [schedule("a", 10, 30)];
    let ov = override_on("https://sim.example/test");

    for sess in [Some(&s), None] {
      let r = resolve_video_source(ResolveInput {
        session:        sess,
        video_override: Some(&ov),
        schedules:      &schedules,
        feeds:          &feeds,
        now:            now(),
        grace:          grace(),
      });
      assert_eq!(r.source, VideoSource::Override);
      assert_eq!(r.url.as_deref(), Some("https://sim.example/test"));
      assert_eq!(r.newly_switched, None);
    }
  }

  #[test]
  fn inactive_override_is_ignored() {
    let s = session("artemis-2", true);
    let feeds = [iss_feed()];
    let ov = VideoOverride::new(Uuid::nil(), Some("https://x".into()), false, now()).unwrap();
    let r = resolve_video_source(ResolveInput {
      session:        Some(&s),
      video_override: Some(&ov),
      schedules:      &[],
      feeds:          &feeds,
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.source, VideoSource::DefaultFeed);
  }

  #[test]
  fn scheduled_feed_wins_inside_switch_window() {
    let s = session("artemis-2", true);
    let feeds = [iss_feed()];
    let schedules = [schedule("crew-12", 20, 30)];
    let r = resolve_video_source(ResolveInput {
      session:        Some(&s),
      video_override: None,
      schedules:      &schedules,
      feeds:          &feeds,
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.source, VideoSource::Scheduled);
    assert_eq!(r.url.as_deref(), Some("https://embed.example/crew-12"));
    assert_eq!(r.newly_switched.as_deref(), Some("crew-12"));
    assert_eq!(r.launch.unwrap().launch_id, "crew-12");
  }

  #[test]
  fn schedule_outside_window_falls_back_to_default_feed() {
    let s = session("artemis-2", true);
    let feeds = [iss_feed()];
    let schedules = [schedule("later", 45, 30), schedule("long-gone", -120, 30)];
    let r = resolve_video_source(ResolveInput {
      session:        Some(&s),
      video_override: None,
      schedules:      &schedules,
      feeds:          &feeds,
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.source, VideoSource::DefaultFeed);
    assert_eq!(r.url.as_deref(), Some("https://embed.example/iss"));
  }

  #[test]
  fn nearest_upcoming_launch_is_preferred() {
    let schedules = [
      schedule("just-launched", -5, 30),
      schedule("far", 25, 60),
      schedule("near", 10, 30),
    ];
    let r = resolve_video_source(ResolveInput {
      session:        None,
      video_override: None,
      schedules:      &schedules,
      feeds:          &[],
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.newly_switched.as_deref(), Some("near"));
  }

  #[test]
  fn unrepresentable_window_falls_back_to_default_feed() {
    let feeds = [iss_feed()];
    let schedules = [schedule("far", 20, 9_000_000_000_000), schedule("max", 20, i64::MAX)];
    let r = resolve_video_source(ResolveInput {
      session:        None,
      video_override: None,
      schedules:      &schedules,
      feeds:          &feeds,
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.source, VideoSource::DefaultFeed);
    assert_eq!(r.newly_switched, None);
  }

  #[test]
  fn schedule_resolves_through_named_feed() {
    let named = IssLiveFeed {
      is_default: false,
      embed_url: "https://embed.example/named".into(),
      ..iss_feed()
    };
    let mut entry = schedule("named", 5, 30);
    entry.feed_url = None;
    entry.feed_id = Some(named.feed_id);

    let feeds = [iss_feed(), named];
    let schedules = [entry];
    let r = resolve_video_source(ResolveInput {
      session:        None,
      video_override: None,
      schedules:      &schedules,
      feeds:          &feeds,
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.url.as_deref(), Some("https://embed.example/named"));
  }

  #[test]
  fn switch_flag_is_sticky() {
    let mut schedules = vec![schedule("crew-12", 20, 30)];
    let feeds = [iss_feed()];

    let first = resolve_video_source(ResolveInput {
      session:        None,
      video_override: None,
      schedules:      &schedules,
      feeds:          &feeds,
      now:            now(),
      grace:          grace(),
    });
    apply_switch(&mut schedules, &first);
    assert!(schedules[0].is_switched);

    let again = resolve_video_source(ResolveInput {
      session:        None,
      video_override: None,
      schedules:      &schedules,
      feeds:          &feeds,
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(again.source, VideoSource::Scheduled);
    assert_eq!(again.newly_switched, None);

    // Well past the grace period the entry no longer plays, but stays switched.
    let later = resolve_video_source(ResolveInput {
      session:        None,
      video_override: None,
      schedules:      &schedules,
      feeds:          &feeds,
      now:            now() + Duration::hours(6),
      grace:          grace(),
    });
    apply_switch(&mut schedules, &later);
    assert_eq!(later.source, VideoSource::DefaultFeed);
    assert!(schedules[0].is_switched);
  }

  #[test]
  fn iss_broadcast_ignores_schedules_but_not_override() {
    let s = session(ISS_MISSION_ID, false);
    let schedules = [schedule("crew-12", 5, 30)];

    let r = resolve_video_source(ResolveInput {
      session:        Some(&s),
      video_override: None,
      schedules:      &schedules,
      feeds:          &[],
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.source, VideoSource::IssBroadcast);
    assert_eq!(r.url.as_deref(), Some(FALLBACK_ISS_EMBED_URL));

    let ov = override_on("https://sim.example/test");
    let r = resolve_video_source(ResolveInput {
      session:        Some(&s),
      video_override: Some(&ov),
      schedules:      &schedules,
      feeds:          &[],
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.source, VideoSource::Override);
  }

  #[test]
  fn disabled_iss_feed_yields_nothing() {
    let s = session("artemis-2", false);
    let feeds = [iss_feed()];
    let r = resolve_video_source(ResolveInput {
      session:        Some(&s),
      video_override: None,
      schedules:      &[],
      feeds:          &feeds,
      now:            now(),
      grace:          grace(),
    });
    assert_eq!(r.source, VideoSource::None);
    assert!(!r.is_playable());
  }
}
