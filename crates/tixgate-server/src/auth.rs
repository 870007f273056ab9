//! HTTP Basic-auth verification and the middleware that turns a verified
//! account into a [`Caller`].

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use tixgate_api::Caller;

use crate::error::Error;

/// One account allowed to use this server instance.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  /// The account ID that scopes every read and write made with these
  /// credentials.
  pub uid:           String,
}

/// Credentials accepted as valid for this server instance.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub accounts: Vec<AccountConfig>,
}

impl AuthConfig {
  fn account(&self, username: &str) -> Option<&AccountConfig> {
    self.accounts.iter().find(|a| a.username == username)
  }
}

/// Verify credentials from headers and resolve the calling account.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<Caller, Error> {
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

  let account = config.account(username).ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Caller { uid: account.uid.clone() })
}

/// Middleware: reject unauthenticated requests, otherwise insert the
/// [`Caller`] into the request extensions for the API handlers.
pub async fn require_caller(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Response {
  match verify_auth(req.headers(), &auth) {
    Ok(caller) => {
      tracing::debug!(uid = %caller.uid, "authenticated");
      req.extensions_mut().insert(caller);
      next.run(req).await
    }
    Err(e) => {
      tracing::debug!(path = %req.uri().path(), "rejected unauthenticated request");
      e.into_response()
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, header};

  use super::*;

  fn make_config(password: &str) -> AuthConfig {
    use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AuthConfig {
      accounts: vec![AccountConfig {
        username:      "door".to_string(),
        password_hash: hash,
        uid:           "org-1".to_string(),
      }],
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials_resolve_account_uid() {
    let config = make_config("secret");
    let caller = verify_auth(&headers(&basic("door", "secret")), &config).unwrap();
    assert_eq!(caller.uid, "org-1");
  }

  #[test]
  fn wrong_password() {
    let config = make_config("secret");
    let result = verify_auth(&headers(&basic("door", "wrong")), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let config = make_config("secret");
    let result = verify_auth(&headers(&basic("nobody", "secret")), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let config = make_config("secret");
    let result = verify_auth(&HeaderMap::new(), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let config = make_config("secret");
    let result = verify_auth(&headers("Basic !!!not-base64!!!"), &config);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }
}
