//! Import orchestrator: cross-sheet resolution, upserts, transaction scope
//!
//! Sheets run in a fixed order (Projects -> Status -> Risks -> Changes)
//! because later sheets resolve project codes against records the first
//! pass just wrote. The whole run shares one transaction: row-level
//! problems are caught and reported, anything unguarded rolls everything
//! back.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use crate::config::repository::{
    categories, changes, phases, projects, risks, users, UpsertOutcome,
};
use crate::config::repository::changes::ChangeRow;
use crate::config::repository::projects::{NewProject, ProjectPatch};
use crate::config::repository::risks::RiskRow;

use super::classify;
use super::normalize;
use super::report::{EntityStats, ImportReport, ImportStats};
use super::types::{DevStatus, FrsStatus, PhaseName, Priority, RagStatus, RiskScore};
use super::workbook::{
    change_cols, load_portfolio_workbook, project_cols, risk_cols, status_cols,
    PortfolioWorkbook, RowAccessor, SheetTable,
};

/// Operator-facing knobs for a run
#[derive(Debug, Default, Clone)]
pub struct ImportOptions {
    /// Create placeholder user accounts for unknown owner names
    pub provision_owners: bool,
}

/// Per-run lookup caches, local to one invocation so concurrent imports of
/// independent files stay isolated.
#[derive(Debug, Default)]
struct ImportContext {
    projects: HashMap<String, i64>,
    categories: HashMap<String, i64>,
    owners: HashMap<String, i64>,
}

/// A recoverable per-row failure. Carried inside `anyhow::Error` and
/// downcast at the row loop; anything else escaping a row is fatal.
#[derive(Debug)]
pub struct RowError(String);

impl RowError {
    fn err(message: impl Into<String>) -> anyhow::Error {
        anyhow::Error::new(RowError(message.into()))
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RowError {}

/// Run a full import of the given workbook against the database.
///
/// Always returns a report; `success: false` means the transaction rolled
/// back and nothing was persisted, whatever the counters say.
pub async fn run_import(
    pool: &SqlitePool,
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> ImportReport {
    let started = Instant::now();
    let mut stats = ImportStats::default();
    let mut errors = Vec::new();

    let workbook = match load_portfolio_workbook(path.as_ref()) {
        Ok(workbook) => workbook,
        Err(e) => {
            log::error!("Import aborted: {:#}", e);
            return ImportReport::rolled_back(format!("{:#}", e), stats, errors);
        }
    };

    let mut tx = match pool.begin().await.context("Failed to start transaction") {
        Ok(tx) => tx,
        Err(e) => return ImportReport::rolled_back(format!("{:#}", e), stats, errors),
    };

    match import_all(&mut tx, &workbook, options, &mut stats, &mut errors).await {
        Ok(()) => match tx.commit().await.context("Failed to commit import") {
            Ok(()) => {
                let duration = started.elapsed().as_secs_f64();
                log::info!(
                    "Import committed in {:.2}s ({} row errors)",
                    duration,
                    errors.len()
                );
                ImportReport::committed(stats, errors, duration)
            }
            Err(e) => ImportReport::rolled_back(format!("{:#}", e), stats, errors),
        },
        Err(e) => {
            log::error!("Import rolled back: {:#}", e);
            if let Err(rollback_err) = tx.rollback().await {
                log::warn!("Rollback itself failed: {}", rollback_err);
            }
            ImportReport::rolled_back(format!("{:#}", e), stats, errors)
        }
    }
}

async fn import_all(
    conn: &mut SqliteConnection,
    workbook: &PortfolioWorkbook,
    options: &ImportOptions,
    stats: &mut ImportStats,
    errors: &mut Vec<String>,
) -> Result<()> {
    let mut ctx = ImportContext::default();

    // Projects first: every later sheet resolves against their codes
    if let Some(sheet) = &workbook.projects {
        import_projects(conn, sheet, options, &mut ctx, &mut stats.projects, errors).await?;
    } else {
        log::warn!("No '{}' sheet found", super::workbook::SHEET_PROJECTS);
    }
    if let Some(sheet) = &workbook.status {
        import_status(conn, sheet, &mut ctx, &mut stats.phases, errors).await?;
    }
    if let Some(sheet) = &workbook.risks {
        import_risks(conn, sheet, &mut ctx, &mut stats.risks, errors).await?;
    }
    if let Some(sheet) = &workbook.changes {
        import_changes(conn, sheet, &mut ctx, &mut stats.changes, errors).await?;
    }
    Ok(())
}

/// Record one row's outcome, separating recoverable row errors from fatal ones
fn record_outcome(
    result: Result<UpsertOutcome>,
    label: &str,
    row_num: usize,
    stats: &mut EntityStats,
    errors: &mut Vec<String>,
) -> Result<()> {
    match result {
        Ok(UpsertOutcome::Created) => stats.created += 1,
        Ok(UpsertOutcome::Updated) => stats.updated += 1,
        Err(e) => match e.downcast::<RowError>() {
            Ok(row_error) => {
                log::debug!("{} row {}: {}", label, row_num, row_error);
                errors.push(format!("{} row {}: {}", label, row_num, row_error));
                stats.errors += 1;
            }
            Err(fatal) => return Err(fatal),
        },
    }
    Ok(())
}

async fn import_projects(
    conn: &mut SqliteConnection,
    sheet: &SheetTable,
    options: &ImportOptions,
    ctx: &mut ImportContext,
    stats: &mut EntityStats,
    errors: &mut Vec<String>,
) -> Result<()> {
    for row in &sheet.rows {
        let acc = RowAccessor::new(sheet, row);
        let code = acc.text("id", project_cols::ID);
        if !classify::is_project_code(&code) {
            continue;
        }
        let result = import_project_row(conn, ctx, options, &acc, &code).await;
        record_outcome(result, "projects", row.row_num, stats, errors)?;
    }
    Ok(())
}

async fn import_project_row(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext,
    options: &ImportOptions,
    acc: &RowAccessor<'_>,
    code: &str,
) -> Result<UpsertOutcome> {
    let name = non_empty(acc.text("project_name", project_cols::NAME));
    let description = non_empty(acc.text("description", project_cols::DESCRIPTION));
    let business_area = non_empty(acc.text("business_area", project_cols::BUSINESS_AREA));
    let blockers = non_empty(acc.text("blockers", project_cols::BLOCKERS));

    let category_id = match non_empty(acc.text("category", project_cols::CATEGORY)) {
        Some(category) => Some(resolve_category(conn, ctx, &category).await?),
        None => None,
    };

    let owner_name = non_empty(acc.text("owner", project_cols::OWNER));
    let owner_id = match &owner_name {
        Some(owner) => resolve_owner(conn, ctx, owner, options.provision_owners).await?,
        None => None,
    };

    let priority = non_empty(acc.text("priority", project_cols::PRIORITY))
        .map(|s| normalize::priority(&s));
    let frs_status = non_empty(acc.text("frs_status", project_cols::FRS_STATUS))
        .map(|s| normalize::frs_status(&s));
    let dev_status = non_empty(acc.text("dev_status", project_cols::DEV_STATUS))
        .map(|s| normalize::dev_status(&s));
    let rag_status =
        non_empty(acc.text("rag", project_cols::RAG)).map(|s| normalize::rag_status(&s));
    let completion_percent = acc
        .number("complete", project_cols::COMPLETE)
        .map(normalize::completion_percent);

    let submission_date = acc.date("submission_date", project_cols::SUBMISSION_DATE);
    let target_date = acc.date("target_date", project_cols::TARGET_DATE);
    let go_live_date = acc.date("go_live_date", project_cols::GO_LIVE_DATE);

    match projects::find_by_code(&mut *conn, code).await? {
        Some(existing) => {
            let patch = ProjectPatch {
                name,
                description,
                category_id,
                business_area,
                priority: priority.map(|p| p.as_str().to_string()),
                frs_status: frs_status.map(|s| s.as_str().to_string()),
                dev_status: dev_status.map(|s| s.as_str().to_string()),
                rag_status: rag_status.map(|s| s.as_str().to_string()),
                completion_percent,
                submission_date,
                target_date,
                go_live_date,
                blockers,
                owner_name,
                owner_id,
            };
            projects::update(&mut *conn, existing.id, &patch).await?;
            ctx.projects.insert(code.to_string(), existing.id);
            Ok(UpsertOutcome::Updated)
        }
        None => {
            let new = NewProject {
                project_code: code.to_string(),
                name: name.unwrap_or_else(|| code.to_string()),
                description,
                category_id,
                business_area,
                priority: priority.unwrap_or(Priority::Medium).as_str().to_string(),
                frs_status: frs_status.unwrap_or(FrsStatus::Draft).as_str().to_string(),
                dev_status: dev_status
                    .unwrap_or(DevStatus::NotStarted)
                    .as_str()
                    .to_string(),
                rag_status: rag_status.unwrap_or(RagStatus::Green).as_str().to_string(),
                completion_percent: completion_percent.unwrap_or(0),
                submission_date,
                target_date,
                go_live_date,
                blockers,
                owner_name,
                owner_id,
            };
            let id = projects::create(&mut *conn, &new).await?;
            ctx.projects.insert(code.to_string(), id);
            Ok(UpsertOutcome::Created)
        }
    }
}

async fn import_status(
    conn: &mut SqliteConnection,
    sheet: &SheetTable,
    ctx: &mut ImportContext,
    stats: &mut EntityStats,
    errors: &mut Vec<String>,
) -> Result<()> {
    for row in &sheet.rows {
        let acc = RowAccessor::new(sheet, row);
        let code = acc.text("project", status_cols::PROJECT);
        if code.is_empty() {
            continue;
        }
        // Unknown codes are template noise on this sheet, not errors
        let project_id = match resolve_project(conn, ctx, &code).await? {
            Some(id) => id,
            None => continue,
        };

        for (offset, phase) in PhaseName::ALL.into_iter().enumerate() {
            let raw = acc.text(phase.header_key(), status_cols::FIRST_PHASE + offset);
            if raw.is_empty() {
                continue;
            }
            let status = normalize::phase_status(&raw);
            let result = phases::upsert_status(&mut *conn, project_id, phase, status).await;
            record_outcome(result, "phases", row.row_num, stats, errors)?;
        }

        if let Some(raw) = acc.number("complete", status_cols::COMPLETE) {
            let percent = normalize::completion_percent(raw);
            projects::set_completion(&mut *conn, project_id, percent).await?;
        }
    }
    Ok(())
}

async fn import_risks(
    conn: &mut SqliteConnection,
    sheet: &SheetTable,
    ctx: &mut ImportContext,
    stats: &mut EntityStats,
    errors: &mut Vec<String>,
) -> Result<()> {
    for row in &sheet.rows {
        let acc = RowAccessor::new(sheet, row);
        let code = acc.text("id", risk_cols::ID);
        if !classify::is_risk_code(&code) {
            continue;
        }
        let result = import_risk_row(conn, ctx, &acc, &code).await;
        record_outcome(result, "risks", row.row_num, stats, errors)?;
    }
    Ok(())
}

async fn import_risk_row(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext,
    acc: &RowAccessor<'_>,
    code: &str,
) -> Result<UpsertOutcome> {
    let project_id = require_project(conn, ctx, &acc.text("project_code", risk_cols::PROJECT)).await?;

    let impact = normalize::risk_impact(&acc.text("impact", risk_cols::IMPACT));
    let probability = normalize::risk_probability(&acc.text("probability", risk_cols::PROBABILITY));
    // Source score cells are never trusted
    let risk_score = RiskScore::from_matrix(impact, probability);

    let row = RiskRow {
        risk_code: code.to_string(),
        project_id,
        description: non_empty(acc.text("description", risk_cols::DESCRIPTION)),
        impact: impact.as_str().to_string(),
        probability: probability.as_str().to_string(),
        risk_score: risk_score.as_str().to_string(),
        mitigation: non_empty(acc.text("mitigation", risk_cols::MITIGATION)),
        owner: non_empty(acc.text("owner", risk_cols::OWNER)),
        status: normalize::risk_status(&acc.text("status", risk_cols::STATUS))
            .as_str()
            .to_string(),
    };
    risks::upsert(conn, &row).await
}

async fn import_changes(
    conn: &mut SqliteConnection,
    sheet: &SheetTable,
    ctx: &mut ImportContext,
    stats: &mut EntityStats,
    errors: &mut Vec<String>,
) -> Result<()> {
    for row in &sheet.rows {
        let acc = RowAccessor::new(sheet, row);
        let code = acc.text("change_id", change_cols::ID);
        if !classify::is_change_code(&code) {
            continue;
        }
        let result = import_change_row(conn, ctx, &acc, &code).await;
        record_outcome(result, "changes", row.row_num, stats, errors)?;
    }
    Ok(())
}

async fn import_change_row(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext,
    acc: &RowAccessor<'_>,
    code: &str,
) -> Result<UpsertOutcome> {
    let project_id =
        require_project(conn, ctx, &acc.text("project_code", change_cols::PROJECT)).await?;

    let row = ChangeRow {
        change_code: code.to_string(),
        project_id,
        description: non_empty(acc.text("description", change_cols::DESCRIPTION)),
        change_type: normalize::change_type(&acc.text("type", change_cols::TYPE))
            .as_str()
            .to_string(),
        status: normalize::change_status(&acc.text("status", change_cols::STATUS))
            .as_str()
            .to_string(),
        requested_by: non_empty(acc.text("requested_by", change_cols::REQUESTED_BY)),
        requested_date: acc.date("date", change_cols::DATE),
    };
    changes::upsert(conn, &row).await
}

/// Cache-first project resolution
async fn resolve_project(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext,
    code: &str,
) -> Result<Option<i64>> {
    if let Some(id) = ctx.projects.get(code) {
        return Ok(Some(*id));
    }
    let found = projects::find_id_by_code(conn, code).await?;
    if let Some(id) = found {
        ctx.projects.insert(code.to_string(), id);
    }
    Ok(found)
}

/// Project resolution where failure is a row error, not a skip
async fn require_project(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext,
    code: &str,
) -> Result<i64> {
    if code.is_empty() {
        return Err(RowError::err("missing project code"));
    }
    resolve_project(conn, ctx, code)
        .await?
        .ok_or_else(|| RowError::err(format!("project code '{}' not found", code)))
}

async fn resolve_category(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext,
    name: &str,
) -> Result<i64> {
    if let Some(id) = ctx.categories.get(name) {
        return Ok(*id);
    }
    let id = categories::first_or_create(conn, name).await?;
    ctx.categories.insert(name.to_string(), id);
    Ok(id)
}

async fn resolve_owner(
    conn: &mut SqliteConnection,
    ctx: &mut ImportContext,
    name: &str,
    provision: bool,
) -> Result<Option<i64>> {
    if let Some(id) = ctx.owners.get(name) {
        return Ok(Some(*id));
    }
    if let Some(id) = users::find_by_name(conn, name).await? {
        ctx.owners.insert(name.to_string(), id);
        return Ok(Some(id));
    }
    if provision {
        let id = users::create_placeholder(conn, name).await?;
        log::info!("Provisioned placeholder owner '{}'", name);
        ctx.owners.insert(name.to_string(), id);
        return Ok(Some(id));
    }
    Ok(None)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
