//! Error types for `mctl-core`.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification shared by every layer of the coordinator.
///
/// Store backends map their own errors onto this so that the HTTP layer and
/// the sync client can decide between 404, 400 and "try again next poll"
/// without knowing which backend produced the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The target session (missing or expired) or milestone does not exist.
  NotFound,
  /// The request was well-formed but violates a domain rule.
  Validation,
  /// The store or network was unavailable; the same call may succeed later.
  Transient,
  /// Corrupt data or a bug.
  Internal,
}

/// Implemented by every store backend's error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("session {0} has expired")]
  SessionExpired(Uuid),

  #[error("milestone not found: {0}")]
  MilestoneNotFound(Uuid),

  #[error("launch feed schedule not found: {0}")]
  ScheduleNotFound(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>, ErrorKind),
}

impl Error {
  /// Wrap a backend error, remembering its classification.
  pub fn store<E: StoreError>(err: E) -> Self {
    let kind = err.kind();
    Self::Store(Box::new(err), kind)
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::SessionNotFound(_)
      | Self::SessionExpired(_)
      | Self::MilestoneNotFound(_)
      | Self::ScheduleNotFound(_) => ErrorKind::NotFound,
      Self::Validation(_) => ErrorKind::Validation,
      Self::Store(_, kind) => *kind,
    }
  }
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind { Error::kind(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
