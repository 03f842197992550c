//! Command-line interface definition

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "portfolio-cli", about = "Excel portfolio register importer", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import a portfolio register workbook into the database
    Import {
        /// Path to the .xlsx register
        file: PathBuf,
        /// Database URL
        #[arg(long, default_value = "sqlite://portfolio.db")]
        database: String,
        /// Create placeholder user accounts for unknown owner names
        #[arg(long)]
        provision_owners: bool,
        /// Print the raw JSON report instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Classify candidate rows in a workbook without writing anything
    Preview {
        /// Path to the .xlsx register
        file: PathBuf,
        /// Print the raw JSON report instead of a summary
        #[arg(long)]
        json: bool,
    },
}
