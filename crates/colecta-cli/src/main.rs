//! `colecta` binary.
//!
//! Reads `colecta.toml` (or the path given with `--config`), opens the
//! local SQLite store on demand, and drives the store CRUD surface, the
//! session slot, and the asset cache lifecycle.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use colecta_core::record::{CaptureStatus, GeoPoint, Role};

mod commands;
mod session;
mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(author, version, about = "Colecta offline-first field data store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "colecta.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Open the store and report versions, counts and session state.
  Status,
  /// Verify the master seed set, healing the store if needed.
  SeedCheck,
  /// Irrecoverably delete the local store.
  Reset {
    /// Confirm the deletion.
    #[arg(long)]
    yes: bool,
  },
  /// Print every record of a table as JSON lines.
  List { table: String },
  /// Print one record by id.
  Show { table: String, id: i64 },
  /// Create a user; prompts for a password on stdin.
  AddUser {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name:  String,
    #[arg(long, value_enum)]
    role:  RoleArg,
  },
  /// Record a draft capture against an indicator.
  Record {
    #[arg(long)]
    indicator: i64,
    /// Counted-total payload.
    #[arg(long, conflicts_with = "scores")]
    total:     Option<u32>,
    /// Participant-scores payload, comma separated.
    #[arg(long, value_delimiter = ',')]
    scores:    Option<Vec<u8>>,
    #[arg(long, requires = "lng")]
    lat:       Option<f64>,
    #[arg(long, requires = "lat")]
    lng:       Option<f64>,
  },
  /// Approve or reject a capture.
  Review {
    id:      i64,
    #[arg(value_enum)]
    verdict: VerdictArg,
  },
  /// Log in and persist a session.
  Login {
    #[arg(long)]
    email: String,
  },
  /// Destroy the current session.
  Logout,
  /// Show the current session.
  Whoami,
  /// Asset cache lifecycle.
  #[command(subcommand)]
  Cache(CacheCommand),
}

#[derive(Subcommand)]
enum CacheCommand {
  /// Fetch the asset manifest into the configured generation bucket.
  Install,
  /// Purge superseded generations and claim the configured one.
  Activate,
  /// Resolve one URL through the configured policy.
  Fetch { url: String },
  /// Report bucket status.
  Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
  Administrator,
  ProjectCoordinator,
  FieldTechnician,
}

impl From<RoleArg> for Role {
  fn from(role: RoleArg) -> Self {
    match role {
      RoleArg::Administrator => Role::Administrator,
      RoleArg::ProjectCoordinator => Role::ProjectCoordinator,
      RoleArg::FieldTechnician => Role::FieldTechnician,
    }
  }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VerdictArg {
  Approved,
  Rejected,
}

impl From<VerdictArg> for CaptureStatus {
  fn from(verdict: VerdictArg) -> Self {
    match verdict {
      VerdictArg::Approved => CaptureStatus::Approved,
      VerdictArg::Rejected => CaptureStatus::Rejected,
    }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  match cli.command {
    Command::Status => commands::status(&settings).await,
    Command::SeedCheck => commands::seed_check(&settings).await,
    Command::Reset { yes } => commands::reset(&settings, yes).await,
    Command::List { table } => commands::list(&settings, &table).await,
    Command::Show { table, id } => commands::show(&settings, &table, id).await,
    Command::AddUser { email, name, role } => {
      commands::add_user(&settings, email, name, role.into()).await
    }
    Command::Record { indicator, total, scores, lat, lng } => {
      let location = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
        _ => None,
      };
      commands::record_capture(&settings, indicator, total, scores, location)
        .await
    }
    Command::Review { id, verdict } => {
      commands::review(&settings, id, verdict.into()).await
    }
    Command::Login { email } => commands::login(&settings, email).await,
    Command::Logout => commands::logout(&settings),
    Command::Whoami => commands::whoami(&settings),
    Command::Cache(cache) => match cache {
      CacheCommand::Install => commands::cache_install(&settings).await,
      CacheCommand::Activate => commands::cache_activate(&settings).await,
      CacheCommand::Fetch { url } => {
        commands::cache_fetch(&settings, &url).await
      }
      CacheCommand::Status => commands::cache_status(&settings).await,
    },
  }
}
