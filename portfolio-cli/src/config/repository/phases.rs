//! Project phase repository: composite-key upserts with derived timestamps
//!
//! Timestamp invariants: `started_at` is set the first time a phase reaches
//! In Progress or Completed and is never cleared afterwards; `completed_at`
//! is set on Completed and cleared if the status regresses away from it.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use sqlx::SqliteConnection;

use super::UpsertOutcome;
use crate::import::types::{PhaseName, PhaseStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PhaseRecord {
    pub id: i64,
    pub project_id: i64,
    pub phase_name: String,
    pub status: String,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// Create the five default phases for a freshly-created project
pub async fn create_defaults(conn: &mut SqliteConnection, project_id: i64) -> Result<()> {
    for phase in PhaseName::ALL {
        sqlx::query("INSERT INTO project_phases (project_id, phase_name, status) VALUES (?, ?, ?)")
            .bind(project_id)
            .bind(phase.as_str())
            .bind(PhaseStatus::Pending.as_str())
            .execute(&mut *conn)
            .await
            .context("Failed to insert default phase")?;
    }
    Ok(())
}

pub async fn find(
    conn: &mut SqliteConnection,
    project_id: i64,
    phase: PhaseName,
) -> Result<Option<PhaseRecord>> {
    sqlx::query_as::<_, PhaseRecord>(
        r#"
        SELECT id, project_id, phase_name, status, started_at, completed_at
        FROM project_phases
        WHERE project_id = ? AND phase_name = ?
        "#,
    )
    .bind(project_id)
    .bind(phase.as_str())
    .fetch_optional(conn)
    .await
    .context("Failed to look up phase")
}

/// Upsert by (project_id, phase_name), applying the timestamp invariants
pub async fn upsert_status(
    conn: &mut SqliteConnection,
    project_id: i64,
    phase: PhaseName,
    status: PhaseStatus,
) -> Result<UpsertOutcome> {
    let now = Utc::now().naive_utc();
    let active = matches!(status, PhaseStatus::InProgress | PhaseStatus::Completed);

    match find(&mut *conn, project_id, phase).await? {
        Some(existing) => {
            let started_at = existing
                .started_at
                .or(if active { Some(now) } else { None });
            let completed_at = if status == PhaseStatus::Completed {
                existing.completed_at.or(Some(now))
            } else {
                None
            };
            sqlx::query(
                "UPDATE project_phases SET status = ?, started_at = ?, completed_at = ? WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(started_at)
            .bind(completed_at)
            .bind(existing.id)
            .execute(conn)
            .await
            .context("Failed to update phase")?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            let started_at = if active { Some(now) } else { None };
            let completed_at = if status == PhaseStatus::Completed {
                Some(now)
            } else {
                None
            };
            sqlx::query(
                r#"
                INSERT INTO project_phases (project_id, phase_name, status, started_at, completed_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(project_id)
            .bind(phase.as_str())
            .bind(status.as_str())
            .bind(started_at)
            .bind(completed_at)
            .execute(conn)
            .await
            .context("Failed to insert phase")?;
            Ok(UpsertOutcome::Created)
        }
    }
}
