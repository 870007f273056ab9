//! Core types and trait definitions for tixgate, the door-side ticket
//! verification service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod error;
pub mod session;
pub mod store;
pub mod ticket;
pub mod verify;

pub use error::{Error, Result};
