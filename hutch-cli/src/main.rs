mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::List(args) => commands::list::execute(args, &cli.global).await,
        Command::Start(args) => commands::start::execute(args, &cli.global).await,
        Command::Stop(args) => commands::stop::execute(args, &cli.global).await,
        Command::Add(args) => commands::add::execute(args, &cli.global).await,
        Command::Rm(args) => commands::rm::execute(args, &cli.global).await,
        Command::Logs(args) => commands::logs::execute(args, &cli.global).await,
    }
}
