//! Change request repository: upsert by `change_code`

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqliteConnection;

use super::UpsertOutcome;

/// Normalized change request row ready to persist
#[derive(Debug, Clone)]
pub struct ChangeRow {
    pub change_code: String,
    pub project_id: i64,
    pub description: Option<String>,
    pub change_type: String,
    pub status: String,
    pub requested_by: Option<String>,
    pub requested_date: Option<NaiveDate>,
}

pub async fn find_id_by_code(conn: &mut SqliteConnection, code: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM change_requests WHERE change_code = ?")
            .bind(code)
            .fetch_optional(conn)
            .await
            .context("Failed to look up change request by code")?;
    Ok(row.map(|(id,)| id))
}

pub async fn upsert(conn: &mut SqliteConnection, row: &ChangeRow) -> Result<UpsertOutcome> {
    match find_id_by_code(&mut *conn, &row.change_code).await? {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE change_requests SET
                    project_id = ?,
                    description = COALESCE(?, description),
                    change_type = ?,
                    status = ?,
                    requested_by = COALESCE(?, requested_by),
                    requested_date = COALESCE(?, requested_date)
                WHERE id = ?
                "#,
            )
            .bind(row.project_id)
            .bind(&row.description)
            .bind(&row.change_type)
            .bind(&row.status)
            .bind(&row.requested_by)
            .bind(row.requested_date)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update change request")?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO change_requests (
                    change_code, project_id, description, change_type,
                    status, requested_by, requested_date
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.change_code)
            .bind(row.project_id)
            .bind(&row.description)
            .bind(&row.change_type)
            .bind(&row.status)
            .bind(&row.requested_by)
            .bind(row.requested_date)
            .execute(conn)
            .await
            .context("Failed to insert change request")?;
            Ok(UpsertOutcome::Created)
        }
    }
}
