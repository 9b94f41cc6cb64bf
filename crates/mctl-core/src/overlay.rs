//! Single-slot video state: the overlay drawn over the player and the
//! operator's video override.
//!
//! Both are slots, not logs: each write replaces the previous value for the
//! session, and the latest write is what every viewer sees on its next poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// The overlay discriminant as it appears on the wire (`overlayType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OverlayKind {
  None,
  StartingSoon,
  TechnicalDifficulties,
  Standby,
  Maintenance,
  Custom,
}

/// What is drawn over the video player.
///
/// `Custom` always carries non-empty text; [`Overlay::from_parts`] is the only
/// way to build one from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "OverlayWire", try_from = "OverlayWire")]
pub enum Overlay {
  #[default]
  None,
  StartingSoon,
  TechnicalDifficulties,
  Standby,
  Maintenance,
  Custom(String),
}

impl Overlay {
  /// Validate an `(overlayType, customText?)` pair.
  ///
  /// `custom` requires non-blank text. Text supplied with any other kind is
  /// ignored.
  pub fn from_parts(kind: OverlayKind, custom_text: Option<String>) -> Result<Self> {
    Ok(match kind {
      OverlayKind::None => Self::None,
      OverlayKind::StartingSoon => Self::StartingSoon,
      OverlayKind::TechnicalDifficulties => Self::TechnicalDifficulties,
      OverlayKind::Standby => Self::Standby,
      OverlayKind::Maintenance => Self::Maintenance,
      OverlayKind::Custom => match custom_text {
        Some(text) if !text.trim().is_empty() => Self::Custom(text),
        _ => {
          return Err(Error::Validation(
            "customText is required when overlayType is custom".into(),
          ));
        }
      },
    })
  }

  pub fn kind(&self) -> OverlayKind {
    match self {
      Self::None => OverlayKind::None,
      Self::StartingSoon => OverlayKind::StartingSoon,
      Self::TechnicalDifficulties => OverlayKind::TechnicalDifficulties,
      Self::Standby => OverlayKind::Standby,
      Self::Maintenance => OverlayKind::Maintenance,
      Self::Custom(_) => OverlayKind::Custom,
    }
  }

  pub fn custom_text(&self) -> Option<&str> {
    match self {
      Self::Custom(text) => Some(text),
      _ => None,
    }
  }

  /// `None` means nothing is drawn.
  pub fn is_visible(&self) -> bool { !matches!(self, Self::None) }

  /// Banner text shown to viewers.
  pub fn headline(&self) -> &str {
    match self {
      Self::None => "",
      Self::StartingSoon => "Starting Soon",
      Self::TechnicalDifficulties => "Technical Difficulties",
      Self::Standby => "Please Stand By",
      Self::Maintenance => "Maintenance",
      Self::Custom(text) => text,
    }
  }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverlayWire {
  overlay_type: OverlayKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  custom_text:  Option<String>,
}

impl From<Overlay> for OverlayWire {
  fn from(overlay: Overlay) -> Self {
    let overlay_type = overlay.kind();
    let custom_text = match overlay {
      Overlay::Custom(text) => Some(text),
      _ => None,
    };
    Self { overlay_type, custom_text }
  }
}

impl TryFrom<OverlayWire> for Overlay {
  type Error = Error;

  fn try_from(wire: OverlayWire) -> Result<Self> {
    Overlay::from_parts(wire.overlay_type, wire.custom_text)
  }
}

/// The current overlay for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOverlay {
  pub session_id: Uuid,
  #[serde(flatten)]
  pub overlay:    Overlay,
  pub is_active:  bool,
  pub updated_at: DateTime<Utc>,
}

impl VideoOverlay {
  pub fn new(session_id: Uuid, overlay: Overlay, now: DateTime<Utc>) -> Self {
    Self {
      session_id,
      is_active: overlay.is_visible(),
      overlay,
      updated_at: now,
    }
  }
}

/// An operator-forced video source that preempts all automatic resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOverride {
  pub session_id: Uuid,
  pub url:        Option<String>,
  pub is_active:  bool,
  pub updated_at: DateTime<Utc>,
}

impl VideoOverride {
  /// An active override must name a URL; an inactive one may keep the last
  /// URL around so the operator can re-enable it.
  pub fn new(
    session_id: Uuid,
    url: Option<String>,
    is_active: bool,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    let url = url.filter(|u| !u.trim().is_empty());
    if is_active && url.is_none() {
      return Err(Error::Validation("an active video override requires a url".into()));
    }
    Ok(Self { session_id, url, is_active, updated_at: now })
  }

  /// The URL to play, if the override is in force.
  pub fn active_url(&self) -> Option<&str> {
    if self.is_active { self.url.as_deref() } else { None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ErrorKind;

  #[test]
  fn custom_overlay_requires_text() {
    let err = Overlay::from_parts(OverlayKind::Custom, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = Overlay::from_parts(OverlayKind::Custom, Some("   ".into())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let overlay =
      Overlay::from_parts(OverlayKind::Custom, Some("Hold for weather".into())).unwrap();
    assert_eq!(overlay.custom_text(), Some("Hold for weather"));
  }

  #[test]
  fn text_is_dropped_for_fixed_overlays() {
    let overlay = Overlay::from_parts(OverlayKind::Standby, Some("ignored".into())).unwrap();
    assert_eq!(overlay, Overlay::Standby);
  }

  #[test]
  fn video_overlay_wire_shape() {
    let now = Utc::now();
    let slot = VideoOverlay::new(Uuid::nil(), Overlay::Custom("Hold for weather".into()), now);
    let json = serde_json::to_value(&slot).unwrap();
    assert_eq!(json["overlayType"], "custom");
    assert_eq!(json["customText"], "Hold for weather");
    assert_eq!(json["isActive"], true);

    let back: VideoOverlay = serde_json::from_value(json).unwrap();
    assert_eq!(back, slot);
  }

  #[test]
  fn wire_custom_without_text_is_rejected() {
    let res = serde_json::from_str::<Overlay>(r#"{"overlayType":"custom"}"#);
    assert!(res.is_err());
    let none: Overlay = serde_json::from_str(r#"{"overlayType":"none"}"#).unwrap();
    assert!(!none.is_visible());
  }

  #[test]
  fn active_override_needs_url() {
    let err = VideoOverride::new(Uuid::nil(), None, true, Utc::now()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let off = VideoOverride::new(Uuid::nil(), Some("https://x".into()), false, Utc::now())
      .unwrap();
    assert_eq!(off.active_url(), None);
  }
}
