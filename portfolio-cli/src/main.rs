use anyhow::Result;
use clap::Parser;

use portfolio_cli::cli::{commands, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Import {
            file,
            database,
            provision_owners,
            json,
        } => commands::import::run(&file, &database, provision_owners, json).await,
        Command::Preview { file, json } => commands::preview::run(&file, json).await,
    }
}
