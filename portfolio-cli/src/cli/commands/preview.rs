//! `preview` command handler: classify rows, write nothing

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::import::{load_portfolio_workbook, preview_workbook};

pub async fn run(file: &Path, json: bool) -> Result<()> {
    let workbook = load_portfolio_workbook(file)?;
    let report = preview_workbook(&workbook);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Candidate rows:".bold());
    println!("  Projects    {:>5}", report.projects);
    println!("  Status rows {:>5}", report.status_rows);
    println!("  Risks       {:>5}", report.risks);
    println!("  Changes     {:>5}", report.changes);

    if !report.sample.is_empty() {
        println!("\n{}", "Sample projects:".bold());
        for sample in &report.sample {
            println!("  {}  {}", sample.project_code.cyan(), sample.name);
        }
    }
    Ok(())
}
