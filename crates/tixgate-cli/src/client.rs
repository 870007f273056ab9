//! Async HTTP client wrapping the tixgate JSON API.

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tixgate_core::{
  ticket::{AttendeeRecord, TicketHistoryRecord},
  verify::VerificationOutcome,
};

/// Connection settings for the tixgate API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Check-in counts returned by `GET /api/events/:id/summary`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSummary {
  pub event_id:  String,
  pub total:     u64,
  pub verified:  u64,
  pub remaining: u64,
}

/// Async HTTP client for the tixgate JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  // ── Door ──────────────────────────────────────────────────────────────────

  /// `POST /api/events/:event_id/verify`
  ///
  /// Every verification outcome comes back as JSON, whatever the status code;
  /// only auth or request errors are returned as `Err`.
  pub async fn verify(
    &self,
    event_id: &str,
    ticket_id: &str,
  ) -> Result<VerificationOutcome> {
    let resp = self
      .auth(self.client.post(self.url(&format!("/events/{event_id}/verify"))))
      .json(&serde_json::json!({ "ticket_id": ticket_id }))
      .send()
      .await
      .context("POST /events/:id/verify failed")?;

    let status = resp.status();
    let bytes = resp.bytes().await.context("reading verify response")?;
    if let Ok(outcome) = serde_json::from_slice::<VerificationOutcome>(&bytes) {
      return Ok(outcome);
    }
    Err(anyhow!("verify returned {status}: {}", error_message(&bytes)))
  }

  /// `GET /api/events/:event_id/attendees`
  pub async fn attendees(&self, event_id: &str) -> Result<Vec<AttendeeRecord>> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/events/{event_id}/attendees"))))
      .send()
      .await
      .context("GET /events/:id/attendees failed")?;
    decode(resp).await
  }

  /// `GET /api/events/:event_id/summary`
  pub async fn summary(&self, event_id: &str) -> Result<EventSummary> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/events/{event_id}/summary"))))
      .send()
      .await
      .context("GET /events/:id/summary failed")?;
    decode(resp).await
  }

  // ── Account ───────────────────────────────────────────────────────────────

  /// `GET /api/history`
  pub async fn history(&self) -> Result<Vec<TicketHistoryRecord>> {
    let resp = self
      .auth(self.client.get(self.url("/history")))
      .send()
      .await
      .context("GET /history failed")?;
    decode(resp).await
  }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
  let status = resp.status();
  if status == StatusCode::UNAUTHORIZED {
    return Err(anyhow!("unauthorized: check username and password"));
  }
  let bytes = resp.bytes().await.context("reading response body")?;
  if !status.is_success() {
    return Err(anyhow!("server returned {status}: {}", error_message(&bytes)));
  }
  serde_json::from_slice(&bytes).context("decoding response body")
}

/// Pull the `error` field out of an API error body, or fall back to the raw
/// text.
fn error_message(body: &[u8]) -> String {
  serde_json::from_slice::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base_url: &str) -> ApiClient {
    ApiClient::new(ApiConfig {
      base_url: base_url.into(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap()
  }

  #[test]
  fn url_joins_without_double_slash() {
    assert_eq!(
      client("http://localhost:8080/").url("/history"),
      "http://localhost:8080/api/history"
    );
  }

  #[test]
  fn error_message_prefers_error_field() {
    assert_eq!(error_message(br#"{"error":"ticket_id must not be empty"}"#), "ticket_id must not be empty");
    assert_eq!(error_message(b"plain text"), "plain text");
  }
}
