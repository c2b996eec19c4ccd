//! Command-line glue for pumproom-sync: argument parsing, wiring the real
//! file system and API client into the pipeline, and reporting the outcome.
//!
//! All pipeline logic lives in the library modules; this module only turns
//! flags and environment variables into a [`SyncConfig`] and calls
//! [`synchronise`] or [`run_checks`].
//!
//! ## How To Use
//! - In CI: set `PUMPROOM_REALM`, `PUMPROOM_REPO_NAME` and `PUMPROOM_API_KEY`
//!   (plus optional `PUMPROOM_ROOT_DIR`, `PUMPROOM_IGNORE`) and run
//!   `pumproom-sync sync`.
//! - Programmatically / in tests: call [`run`] with a constructed [`Cli`].
use crate::client::PumpRoomClient;
use crate::config::{ApiKey, SyncConfig, SyncInputs};
use crate::local_fs::LocalFs;
use crate::synchronise::{run_checks, synchronise};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI for pumproom-sync: validate a content repository and push it to PumpRoom.
#[derive(Parser)]
#[clap(
    name = "pumproom-sync",
    version,
    about = "Validate a content repository, archive it and upload it to the PumpRoom API"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate, archive and upload the repository
    Sync(RepoArgs),
    /// Run only the folder-name and configuration checks
    Check(RepoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Repository root; defaults to the current directory
    #[clap(long, env = "PUMPROOM_ROOT_DIR")]
    pub root_dir: Option<PathBuf>,

    /// Comma-separated path fragments to leave out of the archive
    #[clap(long, env = "PUMPROOM_IGNORE", default_value = "")]
    pub ignore: String,

    /// PumpRoom realm the repository belongs to
    #[clap(long, env = "PUMPROOM_REALM")]
    pub realm: String,

    /// Repository name registered in PumpRoom
    #[clap(long, env = "PUMPROOM_REPO_NAME")]
    pub repo_name: String,

    /// PumpRoom API key
    #[clap(long, env = "PUMPROOM_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// PumpRoom API base URL
    #[clap(long, env = "PUMPROOM_API_URL")]
    pub api_url: Option<String>,
}

impl RepoArgs {
    fn into_config(self) -> Result<SyncConfig> {
        let working_dir =
            std::env::current_dir().context("Failed to determine the working directory")?;
        let inputs = SyncInputs {
            root_dir: self.root_dir,
            ignore: self.ignore,
            realm: self.realm,
            repo_name: self.repo_name,
            api_key: ApiKey::new(self.api_key),
            api_url: self.api_url,
        };
        Ok(SyncConfig::from_inputs(inputs, working_dir))
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let (args, checks_only) = match cli.command {
        Commands::Sync(args) => (args, false),
        Commands::Check(args) => (args, true),
    };
    let config = args.into_config()?;
    config.trace_loaded();

    let fs = LocalFs::new();
    let api = PumpRoomClient::new(config.api_url.clone())?;

    if checks_only {
        return match run_checks(&config, &fs, &api).await {
            Ok(report) => {
                tracing::info!(command = "check", folders = ?report.folders, "Repository checks passed");
                println!("Repository checks passed.");
                Ok(())
            }
            Err(failure) => {
                tracing::error!(command = "check", stage = %failure.stage, error = %failure, "Repository checks failed");
                Err(anyhow::Error::msg(failure.message))
            }
        };
    }

    match synchronise(&config, &fs, &api).await {
        Ok(report) => {
            println!("{}", report.summary);
            tracing::info!(
                command = "sync",
                files = report.archived_files,
                bytes = report.archive_bytes,
                "Repository updated successfully"
            );
            Ok(())
        }
        Err(failure) => {
            tracing::error!(command = "sync", stage = %failure.stage, error = %failure, "Synchronisation failed");
            Err(anyhow::Error::msg(failure.message))
        }
    }
}
