//! Top-level argument parsing and shared flags.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use hutch::{SessionManager, SessionOptions, SocketRegistry};

use crate::commands;

#[derive(Parser, Debug)]
#[command(name = "hutch", version, about = "Manage containers on a hutchd daemon")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Directory holding the daemon socket (defaults to the platform
    /// runtime directory).
    #[arg(long, global = true, env = "HUTCH_RUNTIME_DIR")]
    pub runtime_dir: Option<PathBuf>,

    /// Service name the daemon registers under.
    #[arg(long, global = true, default_value = hutch::DEFAULT_SERVICE_NAME)]
    pub service: String,
}

impl GlobalFlags {
    /// Build a session manager from the flags.
    pub fn create_sessions(&self) -> Arc<SessionManager> {
        let mut options = SessionOptions::default();
        options.service_name = self.service.clone();
        if let Some(dir) = &self.runtime_dir {
            options.runtime_dir = dir.clone();
        }
        let registry = Arc::new(SocketRegistry::new(options.runtime_dir.clone()));
        Arc::new(SessionManager::new(registry, options))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all containers known to the daemon
    List(commands::list::ListArgs),

    /// Start a container
    Start(commands::start::StartArgs),

    /// Stop a running container
    Stop(commands::stop::StopArgs),

    /// Add a container from a local rootfs image
    Add(commands::add::AddArgs),

    /// Delete a container
    Rm(commands::rm::RmArgs),

    /// Show (and optionally follow) a container's logs
    Logs(commands::logs::LogsArgs),
}
