//! # Aarakshan
//!
//! Entry point: the HTTP server and the operator CLI.

use aarakshan::api::{self, AppState, TracingDispatcher};
use aarakshan::cli::{
    cmd_advance, cmd_decide, cmd_export, cmd_import, cmd_init, cmd_seed, cmd_stats,
    cmd_verify_person, open_store,
};
use aarakshan::config::ServerConfig;
use aarakshan_core::seed;
use aarakshan_core::{Decision, Portal};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "aarakshan", version, about = "Aarakshan reservation portal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve(ServerConfig),
    /// Create an empty database.
    Init {
        #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
        database: PathBuf,
        /// Replace an existing database.
        #[arg(long)]
        force: bool,
    },
    /// Load the initial hierarchy, news and premium catalog.
    Seed {
        #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
        database: PathBuf,
    },
    /// Show dashboard counters.
    Stats {
        #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
        database: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Mark a submitted person as verified.
    VerifyPerson {
        #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
        database: PathBuf,
        id: u64,
    },
    /// Move an application to the next committee.
    Advance {
        #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
        database: PathBuf,
        number: String,
        #[arg(long, default_value = "admin")]
        actor: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Approve or reject an application.
    Decide {
        #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
        database: PathBuf,
        number: String,
        #[arg(value_enum)]
        decision: DecisionArg,
        #[arg(long, default_value = "admin")]
        actor: String,
        #[arg(long)]
        message: Option<String>,
    },
    /// Write the whole database as JSON.
    Export {
        #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
        database: PathBuf,
        output: PathBuf,
    },
    /// Load a JSON export into an empty database.
    Import {
        #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
        database: PathBuf,
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DecisionArg {
    Approve,
    Reject,
}

impl From<DecisionArg> for Decision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Approve => Decision::Approve,
            DecisionArg::Reject => Decision::Reject,
        }
    }
}

async fn run_server(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    info!(backend = %config.backend, database = %config.database.display(), "opening store");
    let store = open_store(config.backend, &config.database)?;
    let portal = Portal::new(store, config.portal_options())
        .with_dispatcher(Arc::new(TracingDispatcher));

    if config.seed {
        let report = seed::seed(&portal, Utc::now())?;
        info!(?report, "seed data loaded");
    }
    let purged = portal.purge_expired_sessions(Utc::now())?;
    if purged > 0 {
        info!(purged, "expired sessions removed");
    }
    if config.admin_key.is_none() {
        info!("no admin key configured; /admin routes are closed");
    }

    api::serve(AppState::new(portal, config)).await?;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Serve(config) => run_server(config).await,
        Command::Init { database, force } => cmd_init(&database, force),
        Command::Seed { database } => cmd_seed(&database).map(drop),
        Command::Stats { database, json } => cmd_stats(&database, json).map(drop),
        Command::VerifyPerson { database, id } => cmd_verify_person(&database, id).map(drop),
        Command::Advance {
            database,
            number,
            actor,
            message,
        } => cmd_advance(&database, &number, &actor, message).map(drop),
        Command::Decide {
            database,
            number,
            decision,
            actor,
            message,
        } => cmd_decide(&database, &number, decision.into(), &actor, message).map(drop),
        Command::Export { database, output } => cmd_export(&database, &output).map(drop),
        Command::Import { database, input } => cmd_import(&database, &input).map(drop),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
