//! End-to-end import tests against an in-memory database
//!
//! Fixtures are real .xlsx files written with rust_xlsxwriter, including
//! title/blank rows above the headers to exercise header detection.

use std::path::Path;

use rust_xlsxwriter::Workbook;
use sqlx::SqlitePool;
use tempfile::TempDir;

use portfolio_cli::config;
use portfolio_cli::import::{load_portfolio_workbook, preview_workbook, run_import, ImportOptions};

const PROJECT_HEADER: &[&str] = &[
    "ID", "Project Name", "Submission Date", "Category", "Business Area", "Description", "Owner",
    "Priority", "FRS Status", "Dev Status", "RAG", "% Complete", "Target Date", "Go-Live Date",
    "Blockers",
];
const STATUS_HEADER: &[&str] = &[
    "Project", "FRS", "Development", "Testing", "UAT", "Deployment", "% Complete",
];
const RISK_HEADER: &[&str] = &[
    "ID", "Project Code", "Description", "Impact", "Probability", "Score", "Mitigation", "Owner",
    "Status",
];
const CHANGE_HEADER: &[&str] = &[
    "Change ID", "Project Code", "Description", "Type", "Status", "Requested By", "Date",
];

fn add_sheet(
    workbook: &mut Workbook,
    name: &str,
    title: Option<&str>,
    header_row: u32,
    header: &[&str],
    rows: &[Vec<&str>],
) {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name).unwrap();
    if let Some(title) = title {
        sheet.write_string(0, 0, title).unwrap();
    }
    write_rows(sheet, header_row, &[header.to_vec()]);
    write_rows(sheet, header_row + 1, rows);
}

fn save_workbook(
    path: &Path,
    projects: &[Vec<&str>],
    status: &[Vec<&str>],
    risks: &[Vec<&str>],
    changes: &[Vec<&str>],
) {
    let mut workbook = Workbook::new();
    // Title and blank row above the real Projects headers
    add_sheet(&mut workbook, "PROJECT REGISTER", Some("Portfolio Register 2024"), 2, PROJECT_HEADER, projects);
    add_sheet(&mut workbook, "STATUS TRACKING", None, 0, STATUS_HEADER, status);
    add_sheet(&mut workbook, "RISK & ISSUES LOG", Some("Risk Register"), 1, RISK_HEADER, risks);
    add_sheet(&mut workbook, "CHANGE LOG", None, 0, CHANGE_HEADER, changes);
    workbook.save(path).unwrap();
}

fn write_rows(sheet: &mut rust_xlsxwriter::Worksheet, start: u32, rows: &[Vec<&str>]) {
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                sheet
                    .write_string(start + r as u32, c as u16, *cell)
                    .unwrap();
            }
        }
    }
}

async fn pool() -> SqlitePool {
    config::connect("sqlite::memory:").await.unwrap()
}

fn full_project_row() -> Vec<&'static str> {
    vec![
        "PRISM-001",
        "Mobile App",
        "January 2024",
        "Payments",
        "Retail",
        "New customer mobile app",
        "Alice Martin",
        "haute",
        "draft",
        "en cours",
        "vert",
        "40",
        "30/06/2024",
        "TBD",
        "",
    ]
}

async fn scalar<T>(pool: &SqlitePool, sql: &str) -> T
where
    T: Send + Unpin + for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    sqlx::query_scalar::<_, T>(sql).fetch_one(pool).await.unwrap()
}

#[tokio::test]
async fn creates_project_with_category_and_phases() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    save_workbook(&file, &[full_project_row()], &[], &[], &[]);

    let pool = pool().await;
    let report = run_import(&pool, &file, &ImportOptions::default()).await;

    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.stats.projects.created, 1);
    assert_eq!(report.stats.projects.errors, 0);
    assert!(report.errors.is_empty());
    assert!(report.duration_seconds.is_some());

    let rag: String = scalar(&pool, "SELECT rag_status FROM projects WHERE project_code = 'PRISM-001'").await;
    assert_eq!(rag, "Green");
    let priority: String = scalar(&pool, "SELECT priority FROM projects").await;
    assert_eq!(priority, "High");
    let dev: String = scalar(&pool, "SELECT dev_status FROM projects").await;
    assert_eq!(dev, "In Development");
    let submission: String = scalar(&pool, "SELECT submission_date FROM projects").await;
    assert_eq!(submission, "2024-01-01");
    let target: String = scalar(&pool, "SELECT target_date FROM projects").await;
    assert_eq!(target, "2024-06-30");
    let go_live: Option<String> = scalar(&pool, "SELECT go_live_date FROM projects").await;
    assert_eq!(go_live, None); // "TBD" parses to nothing

    let categories: i64 = scalar(&pool, "SELECT COUNT(*) FROM categories WHERE name = 'Payments'").await;
    assert_eq!(categories, 1);

    let phases: i64 = scalar(&pool, "SELECT COUNT(*) FROM project_phases").await;
    assert_eq!(phases, 5);
    let pending: i64 =
        scalar(&pool, "SELECT COUNT(*) FROM project_phases WHERE status = 'Pending'").await;
    assert_eq!(pending, 5);

    // Owners stay free text unless provisioning is enabled
    let owner_name: String = scalar(&pool, "SELECT owner_name FROM projects").await;
    assert_eq!(owner_name, "Alice Martin");
    let users: i64 = scalar(&pool, "SELECT COUNT(*) FROM users").await;
    assert_eq!(users, 0);
}

#[tokio::test]
async fn import_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    save_workbook(
        &file,
        &[full_project_row()],
        &[vec!["PRISM-001", "done", "en cours", "-", "-", "-", "55"]],
        &[vec!["RISK-001", "PRISM-001", "Latency risk", "High", "Medium", "", "Caching", "Bob", "open"]],
        &[vec!["CHG-001", "PRISM-001", "Scope increase", "périmètre", "approuvé", "Carol", "2024-02-01"]],
    );

    let pool = pool().await;
    let first = run_import(&pool, &file, &ImportOptions::default()).await;
    assert!(first.success);
    assert_eq!(first.stats.projects.created, 1);
    assert_eq!(first.stats.risks.created, 1);
    assert_eq!(first.stats.changes.created, 1);

    let second = run_import(&pool, &file, &ImportOptions::default()).await;
    assert!(second.success);
    assert_eq!(second.stats.projects.created, 0);
    assert_eq!(second.stats.projects.updated, 1);
    assert_eq!(second.stats.risks.created, 0);
    assert_eq!(second.stats.risks.updated, 1);
    assert_eq!(second.stats.changes.created, 0);
    assert_eq!(second.stats.changes.updated, 1);
    assert_eq!(second.stats.phases.created, 0);

    let projects: i64 = scalar(&pool, "SELECT COUNT(*) FROM projects").await;
    assert_eq!(projects, 1);
    let risks: i64 = scalar(&pool, "SELECT COUNT(*) FROM risks").await;
    assert_eq!(risks, 1);
    let changes: i64 = scalar(&pool, "SELECT COUNT(*) FROM change_requests").await;
    assert_eq!(changes, 1);
    let phases: i64 = scalar(&pool, "SELECT COUNT(*) FROM project_phases").await;
    assert_eq!(phases, 5);
}

#[tokio::test]
async fn blank_cells_never_overwrite() {
    let dir = TempDir::new().unwrap();
    let first_file = dir.path().join("first.xlsx");
    save_workbook(&first_file, &[full_project_row()], &[], &[], &[]);

    let second_file = dir.path().join("second.xlsx");
    let sparse = vec!["PRISM-001", "Renamed App", "", "", "", "", "", "", "", "", "", "", "", "", ""];
    save_workbook(&second_file, &[sparse], &[], &[], &[]);

    let pool = pool().await;
    assert!(run_import(&pool, &first_file, &ImportOptions::default()).await.success);
    let report = run_import(&pool, &second_file, &ImportOptions::default()).await;
    assert!(report.success);
    assert_eq!(report.stats.projects.updated, 1);

    let name: String = scalar(&pool, "SELECT name FROM projects").await;
    assert_eq!(name, "Renamed App");
    // Everything the sparse row left blank keeps its stored value
    let rag: String = scalar(&pool, "SELECT rag_status FROM projects").await;
    assert_eq!(rag, "Green");
    let category_id: Option<i64> = scalar(&pool, "SELECT category_id FROM projects").await;
    assert!(category_id.is_some());
    let submission: Option<String> = scalar(&pool, "SELECT submission_date FROM projects").await;
    assert_eq!(submission.as_deref(), Some("2024-01-01"));
    let code: String = scalar(&pool, "SELECT project_code FROM projects").await;
    assert_eq!(code, "PRISM-001");
}

#[tokio::test]
async fn risk_score_always_recomputed() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    save_workbook(
        &file,
        &[full_project_row()],
        &[],
        &[vec!["RISK-001", "PRISM-001", "Latency", "High", "High", "Low", "", "", "open"]],
        &[],
    );

    let pool = pool().await;
    assert!(run_import(&pool, &file, &ImportOptions::default()).await.success);

    // The "Low" score cell is ignored: High x High derives Critical
    let score: String = scalar(&pool, "SELECT risk_score FROM risks WHERE risk_code = 'RISK-001'").await;
    assert_eq!(score, "Critical");
    let impact: String = scalar(&pool, "SELECT impact FROM risks").await;
    assert_eq!(impact, "High");
}

#[tokio::test]
async fn unknown_project_rows_error_without_abort() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    save_workbook(
        &file,
        &[full_project_row()],
        &[],
        &[
            vec!["RISK-007", "PRISM-999", "Orphan risk", "High", "High", "", "", "", "open"],
            vec!["RISK-008", "PRISM-001", "Valid risk", "Low", "Low", "", "", "", "open"],
        ],
        &[vec!["CHG-009", "PRISM-404", "Orphan change", "scope", "", "", ""]],
    );

    let pool = pool().await;
    let report = run_import(&pool, &file, &ImportOptions::default()).await;

    assert!(report.success);
    assert_eq!(report.stats.risks.errors, 1);
    assert_eq!(report.stats.risks.created, 1);
    assert_eq!(report.stats.changes.errors, 1);
    assert!(report.errors.iter().any(|e| e.starts_with("risks row") && e.contains("PRISM-999")));
    assert!(report.errors.iter().any(|e| e.starts_with("changes row") && e.contains("PRISM-404")));

    let risks: i64 = scalar(&pool, "SELECT COUNT(*) FROM risks").await;
    assert_eq!(risks, 1);
    let code: String = scalar(&pool, "SELECT risk_code FROM risks").await;
    assert_eq!(code, "RISK-008");
}

#[tokio::test]
async fn rollback_on_unguarded_failure() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    save_workbook(
        &file,
        &[full_project_row()],
        &[],
        &[],
        &[vec!["CHG-001", "PRISM-001", "Scope", "scope", "", "", ""]],
    );

    let pool = pool().await;
    // Sabotage the schema so the Changes pass hits an unguarded database
    // error after Projects succeeded in the same run
    sqlx::query("DROP TABLE change_requests")
        .execute(&pool)
        .await
        .unwrap();

    let report = run_import(&pool, &file, &ImportOptions::default()).await;
    assert!(!report.success);
    assert!(report.error.is_some());
    // In-memory counters show progress, but nothing was persisted
    assert_eq!(report.stats.projects.created, 1);
    let projects: i64 = scalar(&pool, "SELECT COUNT(*) FROM projects").await;
    assert_eq!(projects, 0);
    let categories: i64 = scalar(&pool, "SELECT COUNT(*) FROM categories").await;
    assert_eq!(categories, 0);
}

#[tokio::test]
async fn phase_timestamps_follow_status_transitions() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("first.xlsx");
    save_workbook(
        &file,
        &[full_project_row()],
        &[vec!["PRISM-001", "done", "en cours", "-", "-", "-", "55"]],
        &[],
        &[],
    );

    let pool = pool().await;
    assert!(run_import(&pool, &file, &ImportOptions::default()).await.success);

    let (status, started, completed): (String, Option<String>, Option<String>) =
        sqlx::query_as("SELECT status, started_at, completed_at FROM project_phases WHERE phase_name = 'FRS'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "Completed");
    assert!(started.is_some());
    assert!(completed.is_some());

    let (dev_status, dev_completed): (String, Option<String>) =
        sqlx::query_as("SELECT status, completed_at FROM project_phases WHERE phase_name = 'Development'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(dev_status, "In Progress");
    assert_eq!(dev_completed, None);

    let completion: i64 = scalar(&pool, "SELECT completion_percent FROM projects").await;
    assert_eq!(completion, 55);

    // Regressing FRS clears completed_at but keeps started_at
    let regress = dir.path().join("second.xlsx");
    save_workbook(
        &regress,
        &[full_project_row()],
        &[vec!["PRISM-001", "en cours", "", "", "", "", ""]],
        &[],
        &[],
    );
    assert!(run_import(&pool, &regress, &ImportOptions::default()).await.success);

    let (status, started, completed): (String, Option<String>, Option<String>) =
        sqlx::query_as("SELECT status, started_at, completed_at FROM project_phases WHERE phase_name = 'FRS'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "In Progress");
    assert!(started.is_some());
    assert_eq!(completed, None);
}

#[tokio::test]
async fn template_rows_are_skipped_silently() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    save_workbook(
        &file,
        &[
            full_project_row(),
            vec!["TOTAL", "12 projects", "", "", "", "", "", "", "", "", "", "", "", "", ""],
            vec!["TBD", "Placeholder", "", "", "", "", "", "", "", "", "", "", "", "", ""],
        ],
        &[],
        &[vec!["template", "", "", "", "", "", "", "", ""]],
        &[],
    );

    let pool = pool().await;
    let report = run_import(&pool, &file, &ImportOptions::default()).await;

    assert!(report.success);
    assert_eq!(report.stats.projects.created, 1);
    assert_eq!(report.stats.projects.errors, 0);
    assert_eq!(report.stats.risks.errors, 0);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn missing_sheets_degrade_the_import() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    // No RISK & ISSUES LOG and no STATUS TRACKING sheet at all
    let mut workbook = Workbook::new();
    add_sheet(&mut workbook, "PROJECT REGISTER", Some("Portfolio Register 2024"), 2, PROJECT_HEADER, &[full_project_row()]);
    add_sheet(&mut workbook, "CHANGE LOG", None, 0, CHANGE_HEADER, &[vec![
        "CHG-001", "PRISM-001", "Scope increase", "scope", "", "", "",
    ]]);
    workbook.save(&file).unwrap();

    let loaded = load_portfolio_workbook(&file).unwrap();
    assert!(loaded.risks.is_none());
    assert!(loaded.status.is_none());

    let pool = pool().await;
    let report = run_import(&pool, &file, &ImportOptions::default()).await;

    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.stats.projects.created, 1);
    assert_eq!(report.stats.changes.created, 1);
    assert_eq!(report.stats.risks.created, 0);
    assert_eq!(report.stats.risks.errors, 0);
    assert!(report.errors.is_empty());
    let risks: i64 = scalar(&pool, "SELECT COUNT(*) FROM risks").await;
    assert_eq!(risks, 0);
}

#[tokio::test]
async fn missing_project_sheet_turns_references_into_row_errors() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    let mut workbook = Workbook::new();
    add_sheet(&mut workbook, "RISK & ISSUES LOG", Some("Risk Register"), 1, RISK_HEADER, &[vec![
        "RISK-001", "PRISM-001", "Latency", "High", "Low", "", "", "", "open",
    ]]);
    add_sheet(&mut workbook, "CHANGE LOG", None, 0, CHANGE_HEADER, &[vec![
        "CHG-001", "PRISM-001", "Scope", "scope", "", "", "",
    ]]);
    workbook.save(&file).unwrap();

    let pool = pool().await;
    let report = run_import(&pool, &file, &ImportOptions::default()).await;

    // Dangling references are row errors, not a failed run
    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.stats.projects.created, 0);
    assert_eq!(report.stats.risks.errors, 1);
    assert_eq!(report.stats.changes.errors, 1);
    assert!(report.errors.iter().any(|e| e.starts_with("risks row") && e.contains("PRISM-001")));
    let projects: i64 = scalar(&pool, "SELECT COUNT(*) FROM projects").await;
    assert_eq!(projects, 0);
    let risks: i64 = scalar(&pool, "SELECT COUNT(*) FROM risks").await;
    assert_eq!(risks, 0);
}

#[tokio::test]
async fn provision_owners_creates_placeholder_users() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    save_workbook(&file, &[full_project_row()], &[], &[], &[]);

    let pool = pool().await;
    let options = ImportOptions { provision_owners: true };
    assert!(run_import(&pool, &file, &options).await.success);

    let (name, email): (String, String) = sqlx::query_as("SELECT name, email FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "Alice Martin");
    assert_eq!(email, "alice-martin@import.local");
    let owner_id: Option<i64> = scalar(&pool, "SELECT owner_id FROM projects").await;
    assert!(owner_id.is_some());
}

#[tokio::test]
async fn preview_classifies_without_writing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("register.xlsx");
    let mut second = full_project_row();
    second[0] = "PRISM-002";
    second[1] = "Data Platform";
    save_workbook(
        &file,
        &[
            full_project_row(),
            second,
            vec!["TOTAL", "", "", "", "", "", "", "", "", "", "", "", "", "", ""],
        ],
        &[
            vec!["PRISM-001", "done", "", "", "", "", ""],
            vec!["UNKNOWN-9", "done", "", "", "", "", ""],
        ],
        &[vec!["RISK-001", "PRISM-001", "", "High", "Low", "", "", "", ""]],
        &[vec!["CHG-001", "PRISM-002", "", "scope", "", "", ""]],
    );

    let workbook = load_portfolio_workbook(&file).unwrap();
    let report = preview_workbook(&workbook);

    assert_eq!(report.projects, 2);
    // UNKNOWN-9 matches the code pattern but not a project from this file
    assert_eq!(report.status_rows, 1);
    assert_eq!(report.risks, 1);
    assert_eq!(report.changes, 1);
    assert!(report.sample.iter().any(|s| s.project_code == "PRISM-001"));
    assert!(report.sample.iter().any(|s| s.name == "Data Platform"));
}
