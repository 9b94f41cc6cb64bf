//! Error type for `mctl-store-sqlite`.

use mctl_core::{ErrorKind, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] mctl_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held a value this build does not know.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => ErrorKind::Transient,
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => match e.sqlite_error_code() {
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
          ErrorKind::Transient
        }
        Some(rusqlite::ErrorCode::ConstraintViolation) => ErrorKind::Validation,
        _ => ErrorKind::Internal,
      },
      Error::Database(_) => ErrorKind::Internal,
      Error::Uuid(_) | Error::DateParse(_) | Error::UnknownValue { .. } => {
        ErrorKind::Internal
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
