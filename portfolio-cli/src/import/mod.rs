//! Excel portfolio register import pipeline
//!
//! Ingests semi-structured project registers (inconsistent headers, mixed
//! date encodings, bilingual free-text status values) and maps them into
//! normalized records with idempotent natural-key upserts.

pub mod classify;
pub mod dates;
pub mod engine;
pub mod normalize;
pub mod report;
pub mod types;
pub mod workbook;

pub use classify::{preview_workbook, PreviewReport};
pub use engine::{run_import, ImportOptions};
pub use report::{EntityStats, ImportReport, ImportStats};
pub use workbook::load_portfolio_workbook;
