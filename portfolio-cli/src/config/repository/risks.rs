//! Risk repository: upsert by `risk_code`

use anyhow::{Context, Result};
use sqlx::SqliteConnection;

use super::UpsertOutcome;

/// Normalized risk row ready to persist. `risk_score` is always the matrix
/// derivation, never a source value.
#[derive(Debug, Clone)]
pub struct RiskRow {
    pub risk_code: String,
    pub project_id: i64,
    pub description: Option<String>,
    pub impact: String,
    pub probability: String,
    pub risk_score: String,
    pub mitigation: Option<String>,
    pub owner: Option<String>,
    pub status: String,
}

pub async fn find_id_by_code(conn: &mut SqliteConnection, code: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM risks WHERE risk_code = ?")
        .bind(code)
        .fetch_optional(conn)
        .await
        .context("Failed to look up risk by code")?;
    Ok(row.map(|(id,)| id))
}

pub async fn upsert(conn: &mut SqliteConnection, row: &RiskRow) -> Result<UpsertOutcome> {
    match find_id_by_code(&mut *conn, &row.risk_code).await? {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE risks SET
                    project_id = ?,
                    description = COALESCE(?, description),
                    impact = ?,
                    probability = ?,
                    risk_score = ?,
                    mitigation = COALESCE(?, mitigation),
                    owner = COALESCE(?, owner),
                    status = ?
                WHERE id = ?
                "#,
            )
            .bind(row.project_id)
            .bind(&row.description)
            .bind(&row.impact)
            .bind(&row.probability)
            .bind(&row.risk_score)
            .bind(&row.mitigation)
            .bind(&row.owner)
            .bind(&row.status)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update risk")?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO risks (
                    risk_code, project_id, description, impact, probability,
                    risk_score, mitigation, owner, status
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.risk_code)
            .bind(row.project_id)
            .bind(&row.description)
            .bind(&row.impact)
            .bind(&row.probability)
            .bind(&row.risk_score)
            .bind(&row.mitigation)
            .bind(&row.owner)
            .bind(&row.status)
            .execute(conn)
            .await
            .context("Failed to insert risk")?;
            Ok(UpsertOutcome::Created)
        }
    }
}
