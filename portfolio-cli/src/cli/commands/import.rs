//! `import` command handler

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;

use crate::config;
use crate::import::{self, EntityStats, ImportOptions, ImportReport};

pub async fn run(
    file: &Path,
    database: &str,
    provision_owners: bool,
    json: bool,
) -> Result<()> {
    let pool = config::connect(database).await?;
    let options = ImportOptions { provision_owners };
    let report = import::run_import(&pool, file, &options).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if !report.success {
        bail!(
            "import failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_summary(report: &ImportReport) {
    let heading = if report.success {
        "Import committed".green().bold()
    } else {
        "Import rolled back - nothing was persisted".red().bold()
    };
    println!("{}", heading);

    print_entity_line("Projects", &report.stats.projects);
    print_entity_line("Phases", &report.stats.phases);
    print_entity_line("Risks", &report.stats.risks);
    print_entity_line("Changes", &report.stats.changes);

    if !report.errors.is_empty() {
        println!("\n{}", "Row errors:".yellow().bold());
        for error in &report.errors {
            println!("  {}", error.yellow());
        }
    }
    if let Some(duration) = report.duration_seconds {
        println!("\nDone in {:.2}s", duration);
    }
    if let Some(error) = &report.error {
        println!("\n{} {}", "Error:".red().bold(), error);
    }
}

fn print_entity_line(label: &str, stats: &EntityStats) {
    println!(
        "  {:<10} created {:>4}  updated {:>4}  errors {:>4}",
        label, stats.created, stats.updated, stats.errors
    );
}
