//! Error types for `tixgate-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("{0} must not be empty")]
  EmptyField(&'static str),

  #[error("a verification is already in progress")]
  SessionBusy,

  #[error("no verification is in progress")]
  SessionIdle,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
