//! The authenticated caller, supplied by whatever layer sits in front of the
//! router.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The account on whose behalf a request runs.
///
/// The router never authenticates anyone itself: the embedding server inserts
/// a `Caller` into the request extensions after checking credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
  pub uid: String,
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Caller>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}
