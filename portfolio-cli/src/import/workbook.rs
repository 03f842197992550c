//! Workbook loading, sheet location and header mapping
//!
//! The four register sheets are located by exact title. Header rows are
//! detected by scanning from the top for a marker in the first cell, which
//! tolerates title and blank rows above the real headers. Column lookup is
//! by normalized header name with a positional fallback, wrapped in
//! [`RowAccessor`] so the rest of the pipeline never touches raw indices.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveDate;

use super::dates;

pub const SHEET_PROJECTS: &str = "PROJECT REGISTER";
pub const SHEET_STATUS: &str = "STATUS TRACKING";
pub const SHEET_RISKS: &str = "RISK & ISSUES LOG";
pub const SHEET_CHANGES: &str = "CHANGE LOG";

// Positional fallback columns per sheet. Header-name lookup takes
// precedence; these only apply when a header is missing or garbled.
pub mod project_cols {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const SUBMISSION_DATE: usize = 2;
    pub const CATEGORY: usize = 3;
    pub const BUSINESS_AREA: usize = 4;
    pub const DESCRIPTION: usize = 5;
    pub const OWNER: usize = 6;
    pub const PRIORITY: usize = 7;
    pub const FRS_STATUS: usize = 8;
    pub const DEV_STATUS: usize = 9;
    pub const RAG: usize = 10;
    pub const COMPLETE: usize = 11;
    pub const TARGET_DATE: usize = 12;
    pub const GO_LIVE_DATE: usize = 13;
    pub const BLOCKERS: usize = 14;
}

pub mod status_cols {
    pub const PROJECT: usize = 0;
    pub const FIRST_PHASE: usize = 1;
    pub const COMPLETE: usize = 6;
}

pub mod risk_cols {
    pub const ID: usize = 0;
    pub const PROJECT: usize = 1;
    pub const DESCRIPTION: usize = 2;
    pub const IMPACT: usize = 3;
    pub const PROBABILITY: usize = 4;
    pub const MITIGATION: usize = 6;
    pub const OWNER: usize = 7;
    pub const STATUS: usize = 8;
}

pub mod change_cols {
    pub const ID: usize = 0;
    pub const PROJECT: usize = 1;
    pub const DESCRIPTION: usize = 2;
    pub const TYPE: usize = 3;
    pub const STATUS: usize = 4;
    pub const REQUESTED_BY: usize = 5;
    pub const DATE: usize = 6;
}

/// How to recognize a sheet's header row by its first cell
#[derive(Debug, Clone, Copy)]
pub enum HeaderMarker {
    /// Trimmed first cell equals this literally
    Exact(&'static str),
    /// Lowercased first cell contains this substring
    Contains(&'static str),
}

impl HeaderMarker {
    fn matches(&self, cell: &str) -> bool {
        match self {
            HeaderMarker::Exact(marker) => cell.trim() == *marker,
            HeaderMarker::Contains(marker) => cell.to_lowercase().contains(marker),
        }
    }
}

/// One data row with its 1-based spreadsheet row number (for error messages)
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub row_num: usize,
    pub cells: Vec<Data>,
}

/// A located sheet: normalized header map plus the rows below the header
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: String,
    pub columns: HashMap<String, usize>,
    pub rows: Vec<SheetRow>,
}

/// The four register sheets; missing sheets degrade to `None`
#[derive(Debug, Default)]
pub struct PortfolioWorkbook {
    pub projects: Option<SheetTable>,
    pub status: Option<SheetTable>,
    pub risks: Option<SheetTable>,
    pub changes: Option<SheetTable>,
}

/// Load all four sheets of a portfolio register into memory
pub fn load_portfolio_workbook<P: AsRef<Path>>(path: P) -> Result<PortfolioWorkbook> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    Ok(PortfolioWorkbook {
        projects: load_sheet(&mut workbook, SHEET_PROJECTS, HeaderMarker::Exact("ID"))?,
        status: load_sheet(&mut workbook, SHEET_STATUS, HeaderMarker::Contains("project"))?,
        risks: load_sheet(&mut workbook, SHEET_RISKS, HeaderMarker::Exact("ID"))?,
        changes: load_sheet(&mut workbook, SHEET_CHANGES, HeaderMarker::Contains("change"))?,
    })
}

fn load_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
    marker: HeaderMarker,
) -> Result<Option<SheetTable>> {
    // Exact, case-sensitive title match
    if !workbook.sheet_names().iter().any(|n| n.as_str() == name) {
        log::debug!("Sheet '{}' not present, skipping", name);
        return Ok(None);
    }

    let range = workbook
        .worksheet_range(name)
        .with_context(|| format!("Failed to read sheet: {}", name))?;
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

    let header_idx = rows
        .iter()
        .position(|row| row.first().map(|c| marker.matches(&cell_text(c))).unwrap_or(false));

    let header_idx = match header_idx {
        Some(idx) => idx,
        None => {
            log::warn!("Sheet '{}' has no recognizable header row, skipping", name);
            return Ok(None);
        }
    };

    let columns = build_column_map(&rows[header_idx]);
    let data_rows = rows
        .into_iter()
        .enumerate()
        .skip(header_idx + 1)
        .map(|(idx, cells)| SheetRow { row_num: idx + 1, cells })
        .collect();

    Ok(Some(SheetTable {
        name: name.to_string(),
        columns,
        rows: data_rows,
    }))
}

/// Normalize a header cell into a lookup key: lowercase, runs of
/// non-alphanumerics collapse to a single underscore, edges trimmed.
pub fn normalize_header(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    let mut last_was_sep = false;
    for ch in text.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            key.push(ch);
            last_was_sep = false;
        } else if !last_was_sep && !key.is_empty() {
            key.push('_');
            last_was_sep = true;
        }
    }
    if key.ends_with('_') {
        key.pop();
    }
    key
}

fn build_column_map(header_row: &[Data]) -> HashMap<String, usize> {
    let mut columns = HashMap::new();
    for (idx, cell) in header_row.iter().enumerate() {
        let key = normalize_header(&cell_text(cell));
        if !key.is_empty() {
            // First occurrence wins on duplicate headers
            columns.entry(key).or_insert(idx);
        }
    }
    columns
}

/// Render a cell as display text (whole floats without the trailing ".0")
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

/// Named-column access over a single row, with positional fallback.
///
/// Lookup order: the normalized header key if the sheet mapped it, else the
/// documented fallback index. Missing cells read as empty, never panic.
pub struct RowAccessor<'a> {
    columns: &'a HashMap<String, usize>,
    cells: &'a [Data],
}

impl<'a> RowAccessor<'a> {
    pub fn new(table: &'a SheetTable, row: &'a SheetRow) -> Self {
        Self {
            columns: &table.columns,
            cells: &row.cells,
        }
    }

    fn cell(&self, key: &str, fallback: usize) -> Option<&Data> {
        let idx = self.columns.get(key).copied().unwrap_or(fallback);
        self.cells.get(idx)
    }

    /// Trimmed text value, empty string when absent
    pub fn text(&self, key: &str, fallback: usize) -> String {
        self.cell(key, fallback)
            .map(cell_text)
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    /// Numeric value; percent signs in text cells are tolerated
    pub fn number(&self, key: &str, fallback: usize) -> Option<f64> {
        match self.cell(key, fallback)? {
            Data::Int(i) => Some(*i as f64),
            Data::Float(f) => Some(*f),
            Data::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
            _ => None,
        }
    }

    /// Date value via the full messy-date parser
    pub fn date(&self, key: &str, fallback: usize) -> Option<NaiveDate> {
        self.cell(key, fallback).and_then(dates::parse_date_cell)
    }
}
