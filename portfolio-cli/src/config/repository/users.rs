//! Owner (user) repository
//!
//! Placeholder accounts provisioned from spreadsheet owner text carry a
//! slug-derived synthetic email and are only created when the operator
//! explicitly opts in (`--provision-owners`).

use anyhow::{Context, Result};
use sqlx::SqliteConnection;

use super::categories::slugify;

pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await
        .context("Failed to look up user")?;
    Ok(row.map(|(id,)| id))
}

pub async fn create_placeholder(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let email = format!("{}@import.local", slugify(name));
    let result = sqlx::query("INSERT INTO users (name, email) VALUES (?, ?)")
        .bind(name)
        .bind(email)
        .execute(conn)
        .await
        .context("Failed to insert placeholder user")?;
    Ok(result.last_insert_rowid())
}
