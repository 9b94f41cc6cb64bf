//! Countdown derivation.
//!
//! The flip to `live` when the countdown reaches zero is a display-only value;
//! it is never written back to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::MissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
  pub days:           i64,
  pub hours:          i64,
  pub minutes:        i64,
  pub seconds:        i64,
  /// Whole seconds until launch, clamped at zero.
  pub total:          i64,
  pub display_status: MissionStatus,
}

impl Countdown {
  fn zero(display_status: MissionStatus) -> Self {
    Self {
      days: 0,
      hours: 0,
      minutes: 0,
      seconds: 0,
      total: 0,
      display_status,
    }
  }

  /// `T-DD:HH:MM:SS`, or `T-HH:MM:SS` once under a day.
  pub fn label(&self) -> String {
    if self.days > 0 {
      format!(
        "T-{:02}:{:02}:{:02}:{:02}",
        self.days, self.hours, self.minutes, self.seconds
      )
    } else {
      format!("T-{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
  }
}

/// Turn `(launch_date, status, now)` into a displayable countdown.
///
/// Only `scheduled` and `upcoming` missions count down; every other status
/// yields all-zero fields. Once `launch_date <= now` a counting-down mission
/// reports `live` as its display status.
pub fn derive_countdown(
  launch_date: DateTime<Utc>,
  status: MissionStatus,
  now: DateTime<Utc>,
) -> Countdown {
  if !status.counts_down() {
    return Countdown::zero(status);
  }

  let remaining_ms = (launch_date - now).num_milliseconds();
  if remaining_ms <= 0 {
    return Countdown::zero(MissionStatus::Live);
  }

  let total = remaining_ms.div_euclid(1000);
  Countdown {
    days:           total / 86_400,
    hours:          (total % 86_400) / 3_600,
    minutes:        (total % 3_600) / 60,
    seconds:        total % 60,
    total,
    display_status: status,
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 11, 1, 9, 0, 0).unwrap() }

  #[test]
  fn one_hour_out() {
    let launch = t0() + Duration::seconds(3600);
    let c = derive_countdown(launch, MissionStatus::Upcoming, t0());
    assert_eq!(c.total, 3600);
    assert_eq!((c.days, c.hours, c.minutes, c.seconds), (0, 1, 0, 0));
    assert_eq!(c.display_status, MissionStatus::Upcoming);
    assert_eq!(c.label(), "T-01:00:00");

    let c = derive_countdown(launch, MissionStatus::Upcoming, t0() + Duration::seconds(1));
    assert_eq!(c.total, 3599);
  }

  #[test]
  fn fields_are_floor_divided() {
    let launch = t0() + Duration::seconds(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5)
      + Duration::milliseconds(900);
    let c = derive_countdown(launch, MissionStatus::Scheduled, t0());
    assert_eq!((c.days, c.hours, c.minutes, c.seconds), (2, 3, 4, 5));
    assert_eq!(c.label(), "T-02:03:04:05");
  }

  #[test]
  fn total_is_monotonic_and_clamped() {
    let launch = t0() + Duration::seconds(90);
    let mut last = i64::MAX;
    for step in 0..200 {
      let now = t0() + Duration::milliseconds(step * 700);
      let c = derive_countdown(launch, MissionStatus::Upcoming, now);
      assert!(c.total <= last);
      assert!(c.total >= 0);
      if now >= launch {
        assert_eq!(c.total, 0);
        assert_eq!(c.display_status, MissionStatus::Live);
      }
      last = c.total;
    }
  }

  #[test]
  fn non_counting_statuses_are_zero() {
    let launch = t0() + Duration::hours(5);
    for status in [
      MissionStatus::Live,
      MissionStatus::Completed,
      MissionStatus::Failed,
      MissionStatus::Delayed,
      MissionStatus::Cancelled,
    ] {
      let c = derive_countdown(launch, status, t0());
      assert_eq!(c.total, 0);
      assert_eq!((c.days, c.hours, c.minutes, c.seconds), (0, 0, 0, 0));
      assert_eq!(c.display_status, status);
    }
  }
}
