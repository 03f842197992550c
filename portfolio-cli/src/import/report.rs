//! Structured import result types

use serde::Serialize;

/// Created/updated/error counters for one entity type
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct EntityStats {
    pub created: u32,
    pub updated: u32,
    pub errors: u32,
}

/// Per-entity counters for a whole run
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ImportStats {
    pub projects: EntityStats,
    pub phases: EntityStats,
    pub risks: EntityStats,
    pub changes: EntityStats,
}

/// The result handed back to the CLI/reporting layer.
///
/// When `success` is false nothing was persisted: the transaction rolled
/// back and the counters only reflect in-memory progress at the moment of
/// failure.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub stats: ImportStats,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportReport {
    pub fn committed(stats: ImportStats, errors: Vec<String>, duration_seconds: f64) -> Self {
        Self {
            success: true,
            stats,
            errors,
            duration_seconds: Some(duration_seconds),
            error: None,
        }
    }

    pub fn rolled_back(message: String, stats: ImportStats, errors: Vec<String>) -> Self {
        Self {
            success: false,
            stats,
            errors,
            duration_seconds: None,
            error: Some(message),
        }
    }
}
