//! Category repository: firstOrCreate-by-name with deterministic colors

use anyhow::{Context, Result};
use sqlx::SqliteConnection;

/// Fixed palette; the hash pick keeps colors stable across reruns
pub const PALETTE: [&str; 8] = [
    "#2563eb", "#16a34a", "#dc2626", "#9333ea", "#ea580c", "#0891b2", "#ca8a04", "#db2777",
];

pub async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await
        .context("Failed to look up category")?;
    Ok(row.map(|(id,)| id))
}

/// First-seen-wins creation: two rows naming the same unknown category
/// resolve to one record.
pub async fn first_or_create(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    if let Some(id) = find_by_name(conn, name).await? {
        return Ok(id);
    }
    let result = sqlx::query("INSERT INTO categories (name, slug, color) VALUES (?, ?, ?)")
        .bind(name)
        .bind(slugify(name))
        .bind(pick_color(name))
        .execute(conn)
        .await
        .context("Failed to insert category")?;
    Ok(result.last_insert_rowid())
}

/// Lowercase, non-alphanumerics collapse to single hyphens
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for ch in name.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
            last_was_sep = false;
        } else if !last_was_sep && !slug.is_empty() {
            slug.push('-');
            last_was_sep = true;
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Deterministic hash into the palette
pub fn pick_color(name: &str) -> &'static str {
    let hash = name
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    PALETTE[(hash as usize) % PALETTE.len()]
}
