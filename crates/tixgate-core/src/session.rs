//! Door-side state machine around a single verification attempt.
//!
//! `Idle → Checking → Finished(outcome)`. A finished session can start the
//! next ticket directly or be reset to `Idle`.

use crate::{Error, Result, verify::VerificationOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VerificationState {
  #[default]
  Idle,
  Checking {
    ticket_id: String,
  },
  Finished(VerificationOutcome),
}

#[derive(Debug, Default)]
pub struct VerificationSession {
  state: VerificationState,
}

impl VerificationSession {
  pub fn new() -> Self { Self::default() }

  pub fn state(&self) -> &VerificationState { &self.state }

  pub fn is_checking(&self) -> bool {
    matches!(self.state, VerificationState::Checking { .. })
  }

  /// Start checking `ticket_id`. Fails while another check is in flight.
  pub fn begin(&mut self, ticket_id: impl Into<String>) -> Result<()> {
    if self.is_checking() {
      return Err(Error::SessionBusy);
    }
    self.state = VerificationState::Checking { ticket_id: ticket_id.into() };
    Ok(())
  }

  /// The outcome of the last finished check, if the session is finished.
  pub fn outcome(&self) -> Option<&VerificationOutcome> {
    match &self.state {
      VerificationState::Finished(outcome) => Some(outcome),
      _ => None,
    }
  }

  /// Record the outcome of the in-flight check.
  pub fn complete(&mut self, outcome: VerificationOutcome) -> Result<()> {
    if !self.is_checking() {
      return Err(Error::SessionIdle);
    }
    self.state = VerificationState::Finished(outcome);
    Ok(())
  }

  pub fn reset(&mut self) { self.state = VerificationState::Idle; }
}
