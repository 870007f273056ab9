//! `tixgate` — door-side client for the tixgate ticket verification server.
//!
//! # Usage
//!
//! ```
//! tixgate --url http://localhost:8080 --user door --password secret verify --event ev-1 T1
//! tixgate --config ~/.config/tixgate/config.toml scan --event ev-1
//! ```
//!
//! `verify` exits non-zero unless the ticket admits its holder, so door
//! scripts can branch on the exit status.

mod client;
mod scan;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tixgate", about = "Verify event tickets at the door")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the tixgate server (default: http://localhost:8080).
  #[arg(long, env = "TIXGATE_URL")]
  url: Option<String>,

  /// Account username.
  #[arg(long, env = "TIXGATE_USER")]
  user: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "TIXGATE_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Verify a single ticket.
  Verify {
    #[arg(long)]
    event:     String,
    ticket_id: String,
  },
  /// Verify tickets read from stdin, one per line, until EOF.
  Scan {
    #[arg(long)]
    event: String,
  },
  /// List an event's attendees and their check-in state.
  Roster {
    #[arg(long)]
    event: String,
  },
  /// Show how many attendees have checked in.
  Summary {
    #[arg(long)]
    event: String,
  },
  /// List the tickets bought by the configured account.
  History,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

const DEFAULT_URL: &str = "http://localhost:8080";

/// CLI flags override the config file, which overrides defaults.
fn resolve_config(args: &Args, file: ConfigFile) -> ApiConfig {
  fn pick(flag: &Option<String>, file: String) -> String {
    flag.clone().unwrap_or(file)
  }

  let mut base_url = pick(&args.url, file.url);
  if base_url.is_empty() {
    base_url = DEFAULT_URL.to_owned();
  }

  ApiConfig {
    base_url,
    username: pick(&args.user, file.username),
    password: pick(&args.password, file.password),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(resolve_config(&args, file_cfg))?;

  match &args.command {
    Command::Verify { event, ticket_id } => {
      let outcome = client.verify(event, ticket_id).await?;
      println!("{}", scan::render(&outcome));
      if !scan::admits(&outcome) {
        return Ok(ExitCode::FAILURE);
      }
    }
    Command::Scan { event } => {
      eprintln!("Scanning tickets for {event}; Ctrl-D to finish.");
      let stdin = tokio::io::BufReader::new(tokio::io::stdin());
      let mut stdout = std::io::stdout();
      let tally = scan::run(stdin, &mut stdout, |ticket_id| {
        let client = client.clone();
        let event = event.clone();
        async move { client.verify(&event, &ticket_id).await }
      })
      .await?;
      eprintln!("{tally}");
    }
    Command::Roster { event } => {
      for attendee in client.attendees(event).await? {
        let mark = if attendee.verified { "x" } else { " " };
        println!(
          "[{mark}] {:<36} {:<28} {:<12} {}",
          attendee.key.ticket_id,
          attendee.details.full_name,
          attendee.details.ticket_type,
          attendee.details.reference
        );
      }
    }
    Command::Summary { event } => {
      let s = client.summary(event).await?;
      println!(
        "{}: {}/{} checked in, {} remaining",
        s.event_id, s.verified, s.total, s.remaining
      );
    }
    Command::History => {
      for record in client.history().await? {
        let state = match &record.verification {
          Some(stamp) => format!("verified {} {}", stamp.verified_date, stamp.verified_time),
          None if record.verified => "verified".to_owned(),
          None => "not yet used".to_owned(),
        };
        println!(
          "{} {}  {:<36} {:<16} {}",
          record.details.purchase_date,
          record.details.purchase_time,
          record.key.ticket_id,
          record.event_id,
          state
        );
      }
    }
  }

  Ok(ExitCode::SUCCESS)
}
