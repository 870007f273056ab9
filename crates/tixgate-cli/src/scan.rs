//! Interactive door mode: one ticket ID per input line.
//!
//! Barcode scanners act as keyboards and terminate each code with a newline,
//! so the same loop serves typed and scanned input.

use std::{collections::BTreeMap, future::Future, io::Write};

use anyhow::Result;
use tixgate_core::{
  session::VerificationSession,
  verify::{OutcomeKind, VerificationOutcome},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};

/// Outcome counts for one scanning session.
#[derive(Debug, Default)]
pub struct ScanTally {
  counts: BTreeMap<&'static str, usize>,
}

impl ScanTally {
  fn record(&mut self, kind: OutcomeKind) {
    *self.counts.entry(kind.into()).or_default() += 1;
  }

  #[cfg(test)]
  pub fn count(&self, kind: OutcomeKind) -> usize {
    let key: &'static str = kind.into();
    self.counts.get(key).copied().unwrap_or(0)
  }

  pub fn total(&self) -> usize { self.counts.values().sum() }
}

impl std::fmt::Display for ScanTally {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} scanned", self.total())?;
    for (kind, n) in &self.counts {
      write!(f, ", {n} {kind}")?;
    }
    Ok(())
  }
}

/// Read ticket IDs from `input` until EOF, verifying each with `verify`.
///
/// A failed request is reported as a transient error for that ticket and the
/// loop moves on; the agent can simply scan again.
pub async fn run<R, F, Fut>(
  input: R,
  out: &mut impl Write,
  mut verify: F,
) -> Result<ScanTally>
where
  R: AsyncBufRead + Unpin,
  F: FnMut(String) -> Fut,
  Fut: Future<Output = Result<VerificationOutcome>>,
{
  let mut session = VerificationSession::new();
  let mut tally = ScanTally::default();
  let mut lines = input.lines();

  while let Some(line) = lines.next_line().await? {
    let ticket_id = line.trim();
    if ticket_id.is_empty() {
      session.reset();
      continue;
    }

    session.begin(ticket_id)?;
    let outcome = match verify(ticket_id.to_owned()).await {
      Ok(outcome) => outcome,
      Err(e) => {
        tracing::warn!(ticket_id, error = %e, "verification request failed");
        VerificationOutcome::transient()
      }
    };
    tally.record(outcome.kind());
    writeln!(out, "{}", render(&outcome))?;
    session.complete(outcome)?;
  }

  Ok(tally)
}

/// Whether the agent should let the holder in.
pub fn admits(outcome: &VerificationOutcome) -> bool {
  matches!(
    outcome.kind(),
    OutcomeKind::Success | OutcomeKind::AlreadyVerified
  )
}

/// One-line rendering of an outcome for the terminal.
pub fn render(outcome: &VerificationOutcome) -> String {
  let label = match outcome.kind() {
    OutcomeKind::Success => "ADMIT",
    OutcomeKind::AlreadyVerified => "REPEAT",
    OutcomeKind::NotFound | OutcomeKind::InvalidData | OutcomeKind::Inconsistent => "REJECT",
    OutcomeKind::TransientError => "RETRY",
  };
  format!("[{label}] {}", outcome.message())
}

#[cfg(test)]
mod tests {
  use anyhow::anyhow;
  use tixgate_core::ticket::TicketView;

  use super::*;

  fn ticket() -> TicketView {
    TicketView {
      ticket_id:     "T1".into(),
      full_name:     "Ada".into(),
      email:         "ada@example.com".into(),
      ticket_type:   "General".into(),
      purchase_date: "2026-09-01".into(),
      purchase_time: "10:00:00".into(),
      reference:     "REF-Ada".into(),
      is_verified:   false,
      verification:  None,
    }
  }

  fn not_found(id: &str) -> VerificationOutcome {
    VerificationOutcome::NotFound { message: format!("ticket {id} was not found") }
  }

  #[tokio::test]
  async fn scans_every_non_blank_line() {
    let input: &[u8] = b"T1\n\n  T2 \r\nBROKEN\n";
    let mut out = Vec::new();
    let mut seen = Vec::new();

    let tally = run(input, &mut out, |id| {
      seen.push(id.clone());
      async move {
        if id == "BROKEN" {
          Err(anyhow!("connection refused"))
        } else {
          Ok(not_found(&id))
        }
      }
    })
    .await
    .unwrap();

    assert_eq!(seen, ["T1", "T2", "BROKEN"]);
    assert_eq!(tally.total(), 3);
    assert_eq!(tally.count(OutcomeKind::NotFound), 2);
    assert_eq!(tally.count(OutcomeKind::TransientError), 1);

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("[REJECT] ticket T2 was not found"), "{printed}");
    assert!(printed.contains("[RETRY]"), "{printed}");
  }

  #[test]
  fn only_success_and_repeat_admit() {
    assert!(admits(&VerificationOutcome::Success { ticket: ticket() }));
    assert!(admits(&VerificationOutcome::AlreadyVerified { ticket: ticket() }));
    assert!(!admits(&not_found("T1")));
    assert!(!admits(&VerificationOutcome::transient()));
    assert!(!admits(&VerificationOutcome::Inconsistent { message: "x".into() }));
    assert!(!admits(&VerificationOutcome::InvalidData { message: "x".into() }));
  }

  #[test]
  fn tally_display_lists_counts() {
    let mut tally = ScanTally::default();
    tally.record(OutcomeKind::Success);
    tally.record(OutcomeKind::Success);
    tally.record(OutcomeKind::AlreadyVerified);
    assert_eq!(tally.to_string(), "3 scanned, 1 already_verified, 2 success");
  }
}
