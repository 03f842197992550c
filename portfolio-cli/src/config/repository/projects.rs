//! Project repository: upsert-by-code with non-destructive merges
//!
//! `project_code` is the natural key and is immutable once assigned; no
//! update path here touches it. Creating a project cascades the five
//! default phase records.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqliteConnection;

use super::phases;

/// A stored project, as read back for merging and reporting
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRecord {
    pub id: i64,
    pub project_code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub business_area: Option<String>,
    pub priority: String,
    pub frs_status: String,
    pub dev_status: String,
    pub rag_status: String,
    pub completion_percent: i64,
    pub submission_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub go_live_date: Option<NaiveDate>,
    pub blockers: Option<String>,
    pub owner_name: Option<String>,
    pub owner_id: Option<i64>,
}

/// Fields for a brand-new project; defaults applied by the caller
#[derive(Debug, Clone)]
pub struct NewProject {
    pub project_code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub business_area: Option<String>,
    pub priority: String,
    pub frs_status: String,
    pub dev_status: String,
    pub rag_status: String,
    pub completion_percent: i64,
    pub submission_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub go_live_date: Option<NaiveDate>,
    pub blockers: Option<String>,
    pub owner_name: Option<String>,
    pub owner_id: Option<i64>,
}

/// Partial update: `None` fields keep their stored value. A blank source
/// cell therefore never overwrites existing data.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub business_area: Option<String>,
    pub priority: Option<String>,
    pub frs_status: Option<String>,
    pub dev_status: Option<String>,
    pub rag_status: Option<String>,
    pub completion_percent: Option<i64>,
    pub submission_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub go_live_date: Option<NaiveDate>,
    pub blockers: Option<String>,
    pub owner_name: Option<String>,
    pub owner_id: Option<i64>,
}

pub async fn find_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> Result<Option<ProjectRecord>> {
    sqlx::query_as::<_, ProjectRecord>(
        r#"
        SELECT id, project_code, name, description, category_id, business_area,
               priority, frs_status, dev_status, rag_status, completion_percent,
               submission_date, target_date, go_live_date, blockers,
               owner_name, owner_id
        FROM projects
        WHERE project_code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(conn)
    .await
    .context("Failed to look up project by code")
}

pub async fn find_id_by_code(conn: &mut SqliteConnection, code: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM projects WHERE project_code = ?")
        .bind(code)
        .fetch_optional(conn)
        .await
        .context("Failed to resolve project code")?;
    Ok(row.map(|(id,)| id))
}

/// Insert a project and cascade its five default phases
pub async fn create(conn: &mut SqliteConnection, project: &NewProject) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO projects (
            project_code, name, description, category_id, business_area,
            priority, frs_status, dev_status, rag_status, completion_percent,
            submission_date, target_date, go_live_date, blockers,
            owner_name, owner_id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&project.project_code)
    .bind(&project.name)
    .bind(&project.description)
    .bind(project.category_id)
    .bind(&project.business_area)
    .bind(&project.priority)
    .bind(&project.frs_status)
    .bind(&project.dev_status)
    .bind(&project.rag_status)
    .bind(project.completion_percent)
    .bind(project.submission_date)
    .bind(project.target_date)
    .bind(project.go_live_date)
    .bind(&project.blockers)
    .bind(&project.owner_name)
    .bind(project.owner_id)
    .execute(&mut *conn)
    .await
    .context("Failed to insert project")?;

    let id = result.last_insert_rowid();
    phases::create_defaults(conn, id).await?;
    Ok(id)
}

/// Merge a patch over an existing project. `COALESCE` keeps stored values
/// wherever the patch carries `None`.
pub async fn update(conn: &mut SqliteConnection, id: i64, patch: &ProjectPatch) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE projects SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            category_id = COALESCE(?, category_id),
            business_area = COALESCE(?, business_area),
            priority = COALESCE(?, priority),
            frs_status = COALESCE(?, frs_status),
            dev_status = COALESCE(?, dev_status),
            rag_status = COALESCE(?, rag_status),
            completion_percent = COALESCE(?, completion_percent),
            submission_date = COALESCE(?, submission_date),
            target_date = COALESCE(?, target_date),
            go_live_date = COALESCE(?, go_live_date),
            blockers = COALESCE(?, blockers),
            owner_name = COALESCE(?, owner_name),
            owner_id = COALESCE(?, owner_id),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.category_id)
    .bind(&patch.business_area)
    .bind(&patch.priority)
    .bind(&patch.frs_status)
    .bind(&patch.dev_status)
    .bind(&patch.rag_status)
    .bind(patch.completion_percent)
    .bind(patch.submission_date)
    .bind(patch.target_date)
    .bind(patch.go_live_date)
    .bind(&patch.blockers)
    .bind(&patch.owner_name)
    .bind(patch.owner_id)
    .bind(id)
    .execute(conn)
    .await
    .context("Failed to update project")?;
    Ok(())
}

pub async fn set_completion(conn: &mut SqliteConnection, id: i64, percent: i64) -> Result<()> {
    sqlx::query(
        "UPDATE projects SET completion_percent = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(percent)
    .bind(id)
    .execute(conn)
    .await
    .context("Failed to update completion percent")?;
    Ok(())
}

/// Allocate the next sequential `PREFIX-NNN` code for a prefix
pub async fn next_code(conn: &mut SqliteConnection, prefix: &str) -> Result<String> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT project_code FROM projects WHERE project_code LIKE ?")
            .bind(format!("{}-%", prefix))
            .fetch_all(conn)
            .await
            .context("Failed to scan project codes")?;

    let max = rows
        .iter()
        .filter_map(|(code,)| code.rsplit('-').next())
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    Ok(format!("{}-{:03}", prefix, max + 1))
}
