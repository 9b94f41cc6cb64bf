//! Client for a Launch Library 2 compatible upcoming-launch listing.
//!
//! Only the handful of fields needed to seed a mission session are decoded;
//! everything else in the payload is ignored.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use mctl_core::{
  feed::NewSchedule,
  session::{MissionStatus, NewSession},
};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_CATALOGUE_URL: &str = "https://ll.thespacedevs.com/2.2.0";

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Page {
  #[serde(default)]
  results: Vec<Launch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Launch {
  pub id:                      String,
  pub name:                    String,
  pub net:                     DateTime<Utc>,
  #[serde(default)]
  pub status:                  Option<Named>,
  #[serde(default)]
  pub launch_service_provider: Option<Named>,
  #[serde(default)]
  pub rocket:                  Option<Rocket>,
  #[serde(default)]
  pub mission:                 Option<Mission>,
  #[serde(default)]
  pub pad:                     Option<Pad>,
  #[serde(default, rename = "vidURLs", alias = "vid_urls")]
  pub videos:                  Vec<VideoLink>,
  #[serde(default)]
  pub mission_patches:         Vec<Patch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
  #[serde(default)]
  pub name:   String,
  #[serde(default)]
  pub abbrev: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rocket {
  pub configuration: Named,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mission {
  #[serde(default)]
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub orbit:       Option<Named>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pad {
  #[serde(default)]
  pub name:     String,
  #[serde(default)]
  pub location: Option<Named>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoLink {
  pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Patch {
  #[serde(default)]
  pub image_url: Option<String>,
}

// ─── Mapping ──────────────────────────────────────────────────────────────────

impl Launch {
  /// The catalogue's short status (`Go`, `TBD`, `Hold`, ...).
  pub fn status_abbrev(&self) -> &str {
    self
      .status
      .as_ref()
      .and_then(|s| s.abbrev.as_deref())
      .unwrap_or("")
  }

  pub fn mission_status(&self) -> MissionStatus {
    match self.status_abbrev() {
      "Go" => MissionStatus::Upcoming,
      "Hold" => MissionStatus::Delayed,
      "In Flight" => MissionStatus::Live,
      "Success" => MissionStatus::Completed,
      "Failure" | "Partial Failure" => MissionStatus::Failed,
      _ => MissionStatus::Scheduled,
    }
  }

  pub fn provider(&self) -> &str {
    self
      .launch_service_provider
      .as_ref()
      .map(|p| p.name.as_str())
      .unwrap_or("")
  }

  pub fn vehicle(&self) -> &str {
    self
      .rocket
      .as_ref()
      .map(|r| r.configuration.name.as_str())
      .unwrap_or("")
  }

  pub fn video_url(&self) -> Option<&str> {
    self
      .videos
      .iter()
      .map(|v| v.url.as_str())
      .find(|u| !u.trim().is_empty())
  }

  fn launch_site(&self) -> String {
    let Some(pad) = &self.pad else { return String::new() };
    match pad.location.as_ref().map(|l| l.name.as_str()) {
      Some(location) if !location.is_empty() => format!("{}, {location}", pad.name),
      _ => pad.name.clone(),
    }
  }

  /// Build a session for this launch. The default milestone template is
  /// used; the mission description, if any, becomes the sole objective.
  pub fn into_new_session(self) -> NewSession {
    let status = self.mission_status();
    let agency = self.provider().to_owned();
    let vehicle = self.vehicle().to_owned();
    let launch_site = self.launch_site();
    let live_stream_url = self.video_url().map(str::to_owned);
    let mission_patch_url = self.mission_patches.iter().find_map(|p| p.image_url.clone());

    let (payload, destination, objectives) = match self.mission {
      Some(m) => (
        m.name,
        m.orbit.map(|o| o.name).unwrap_or_default(),
        m.description
          .filter(|d| !d.trim().is_empty())
          .into_iter()
          .collect(),
      ),
      None => (String::new(), String::new(), Vec::new()),
    };

    NewSession {
      mission_id: self.id,
      mission_name: self.name,
      agency,
      launch_date: self.net,
      status,
      vehicle,
      payload,
      destination,
      launch_site,
      live_stream_url,
      mission_patch_url,
      iss_feed_enabled: true,
      milestones: None,
      objectives,
    }
  }

  /// A feed-switch entry for this launch, if it publishes a stream.
  pub fn schedule(&self, switch_time_minutes: i64) -> Option<NewSchedule> {
    let url = self.video_url()?;
    Some(NewSchedule {
      launch_id: self.id.clone(),
      launch_name: self.name.clone(),
      launch_date: self.net,
      feed_url: Some(url.to_owned()),
      feed_id: None,
      switch_time_minutes,
    })
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct CatalogueClient {
  client:   Client,
  base_url: String,
}

impl CatalogueClient {
  pub fn new(base_url: &str) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .user_agent(concat!("mctl/", env!("CARGO_PKG_VERSION")))
      .build()
      .context("building catalogue HTTP client")?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_owned(),
    })
  }

  async fn get<T: serde::de::DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
    let url = format!("{}{path}", self.base_url);
    let resp = self
      .client
      .get(&url)
      .send()
      .await
      .with_context(|| format!("GET {url}"))?;
    let status = resp.status();
    if !status.is_success() {
      bail!("{what} failed: catalogue returned {status}");
    }
    resp.json().await.with_context(|| format!("decoding {what}"))
  }

  /// Upcoming launches, soonest first.
  pub async fn upcoming(&self, limit: u32) -> Result<Vec<Launch>> {
    let page: Page = self
      .get(&format!("/launch/upcoming/?limit={limit}&mode=detailed"), "listing launches")
      .await?;
    Ok(page.results)
  }

  pub async fn launch(&self, launch_id: &str) -> Result<Launch> {
    self
      .get(&format!("/launch/{launch_id}/?mode=detailed"), "fetching launch")
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAGE: &str = r#"{
    "count": 2,
    "results": [
      {
        "id": "f1d5d0a8-6c7b-4e5b-9d0e-2f1f1c1e0a01",
        "name": "Falcon 9 Block 5 | Starlink Group 10-3",
        "net": "2026-11-02T04:12:00Z",
        "status": { "id": 1, "name": "Go for Launch", "abbrev": "Go" },
        "launch_service_provider": { "id": 121, "name": "SpaceX" },
        "rocket": { "configuration": { "name": "Falcon 9" } },
        "mission": {
          "name": "Starlink Group 10-3",
          "description": "A batch of satellites for the Starlink constellation.",
          "orbit": { "name": "Low Earth Orbit", "abbrev": "LEO" }
        },
        "pad": {
          "name": "Space Launch Complex 40",
          "location": { "name": "Cape Canaveral SFS, FL, USA" }
        },
        "vidURLs": [ { "priority": 10, "url": "https://www.youtube.com/watch?v=abc" } ],
        "mission_patches": [ { "image_url": "https://example.com/patch.png" } ]
      },
      {
        "id": "0b8e6d52-3f5e-4a9b-8c6d-000000000002",
        "name": "Unknown Payload",
        "net": "2026-12-01T00:00:00Z",
        "status": { "name": "To Be Determined", "abbrev": "TBD" },
        "mission": null,
        "pad": null
      }
    ]
  }"#;

  fn launches() -> Vec<Launch> {
    let page: Page = serde_json::from_str(PAGE).unwrap();
    page.results
  }

  #[test]
  fn parses_detailed_page() {
    let launches = launches();
    assert_eq!(launches.len(), 2);
    assert_eq!(launches[0].provider(), "SpaceX");
    assert_eq!(launches[0].vehicle(), "Falcon 9");
    assert_eq!(launches[0].video_url(), Some("https://www.youtube.com/watch?v=abc"));
    assert!(launches[1].mission.is_none());
    assert!(launches[1].videos.is_empty());
  }

  #[test]
  fn maps_launch_to_session() {
    let spec = launches().remove(0).into_new_session();
    assert_eq!(spec.mission_id, "f1d5d0a8-6c7b-4e5b-9d0e-2f1f1c1e0a01");
    assert_eq!(spec.status, MissionStatus::Upcoming);
    assert_eq!(spec.payload, "Starlink Group 10-3");
    assert_eq!(spec.destination, "Low Earth Orbit");
    assert_eq!(spec.launch_site, "Space Launch Complex 40, Cape Canaveral SFS, FL, USA");
    assert_eq!(spec.mission_patch_url.as_deref(), Some("https://example.com/patch.png"));
    assert_eq!(spec.objectives.len(), 1);
    assert!(spec.milestones.is_none());
  }

  #[test]
  fn sparse_launch_still_maps() {
    let launch = launches().remove(1);
    assert!(launch.schedule(30).is_none());
    let spec = launch.into_new_session();
    assert_eq!(spec.status, MissionStatus::Scheduled);
    assert_eq!(spec.agency, "");
    assert!(spec.objectives.is_empty());
    assert!(spec.live_stream_url.is_none());
  }

  #[test]
  fn schedule_uses_stream_url() {
    let schedule = launches()[0].schedule(45).unwrap();
    assert_eq!(schedule.switch_time_minutes, 45);
    assert_eq!(schedule.feed_url.as_deref(), Some("https://www.youtube.com/watch?v=abc"));
  }
}
