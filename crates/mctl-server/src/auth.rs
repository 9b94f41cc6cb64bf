//! Operator HTTP Basic auth: credential verification and the middleware that
//! guards every mutating request.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, Method},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use tracing::debug;

use crate::error::Error;

/// Operator credentials accepted by this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Hash `password` into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// Verify Basic credentials in `headers` against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(())
}

/// Reads never need credentials.
fn is_read(method: &Method) -> bool {
  matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// `POST /api/iss-feed/schedules/{launchId}/switch`. Viewers persist the
/// one-way switch flag without credentials; repeating it changes nothing.
fn is_viewer_switch(method: &Method, path: &str) -> bool {
  *method == Method::POST
    && path
      .strip_prefix("/api/iss-feed/schedules/")
      .and_then(|rest| rest.strip_suffix("/switch"))
      .is_some_and(|launch_id| !launch_id.is_empty() && !launch_id.contains('/'))
}

/// Middleware: with auth configured, reject mutating requests that lack valid
/// operator credentials. Without it, everything passes.
pub async fn require_operator(
  State(auth): State<Option<Arc<AuthConfig>>>,
  req: Request,
  next: Next,
) -> Response {
  if let Some(auth) = &auth
    && !is_read(req.method())
    && !is_viewer_switch(req.method(), req.uri().path())
    && let Err(e) = verify_auth(req.headers(), auth)
  {
    debug!(method = %req.method(), uri = %req.uri(), "rejected unauthenticated mutation");
    return e.into_response();
  }
  next.run(req).await
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, header};

  use super::*;

  fn config(password: &str) -> AuthConfig {
    AuthConfig {
      username:      "flight".to_string(),
      password_hash: hash_password(password).unwrap(),
    }
  }

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("Basic {}", B64.encode(format!("{user}:{pass}")));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
    headers
  }

  #[test]
  fn correct_credentials() {
    assert!(verify_auth(&basic("flight", "secret"), &config("secret")).is_ok());
  }

  #[test]
  fn wrong_password() {
    let result = verify_auth(&basic("flight", "wrong"), &config("secret"));
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn wrong_user() {
    let result = verify_auth(&basic("capcom", "secret"), &config("secret"));
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let result = verify_auth(&HeaderMap::new(), &config("secret"));
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!not-base64!!!"));
    let result = verify_auth(&headers, &config("secret"));
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn reads_are_exempt() {
    assert!(is_read(&Method::GET));
    assert!(!is_read(&Method::POST));
    assert!(!is_read(&Method::DELETE));
  }

  #[test]
  fn only_the_switch_route_is_open_to_viewers() {
    assert!(is_viewer_switch(&Method::POST, "/api/iss-feed/schedules/ll2-1/switch"));
    assert!(!is_viewer_switch(&Method::DELETE, "/api/iss-feed/schedules/ll2-1/switch"));
    assert!(!is_viewer_switch(&Method::POST, "/api/iss-feed/schedules//switch"));
    assert!(!is_viewer_switch(&Method::POST, "/api/iss-feed/schedules/a/b/switch"));
    assert!(!is_viewer_switch(&Method::POST, "/api/iss-feed/schedule"));
    assert!(!is_viewer_switch(&Method::POST, "/api/session"));
  }
}
