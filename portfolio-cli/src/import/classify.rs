//! Row discriminators and the read-only preview mode
//!
//! Discriminators decide whether a row is data at all. Rows that fail are
//! template/blank noise and are skipped silently, which is distinct from
//! row errors downstream. Preview reuses the same predicates with zero
//! writes so operators can sanity-check a file before importing.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::workbook::{
    change_cols, project_cols, risk_cols, status_cols, PortfolioWorkbook, RowAccessor,
};

static PROJECT_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+-\d+$").unwrap());
static RISK_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^RISK-\d+$").unwrap());
static CHANGE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^CHG-\d+$").unwrap());

/// Prefix-hyphen-digits, e.g. `PRISM-001`
pub fn is_project_code(value: &str) -> bool {
    PROJECT_CODE_RE.is_match(value.trim())
}

pub fn is_risk_code(value: &str) -> bool {
    RISK_CODE_RE.is_match(value.trim())
}

pub fn is_change_code(value: &str) -> bool {
    CHANGE_CODE_RE.is_match(value.trim())
}

/// A sampled project row shown to the operator before a real import
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSample {
    pub project_code: String,
    pub name: String,
}

/// Candidate-row counts per sheet plus a small project sample
#[derive(Debug, Default, Serialize)]
pub struct PreviewReport {
    pub projects: usize,
    pub status_rows: usize,
    pub risks: usize,
    pub changes: usize,
    pub sample: Vec<ProjectSample>,
}

const SAMPLE_SIZE: usize = 5;

/// Classify every sheet of an already-loaded workbook without touching the
/// database. Status rows are matched against the project codes found in the
/// same file.
pub fn preview_workbook(workbook: &PortfolioWorkbook) -> PreviewReport {
    let mut report = PreviewReport::default();
    let mut known_codes: HashSet<String> = HashSet::new();

    if let Some(sheet) = &workbook.projects {
        for row in &sheet.rows {
            let acc = RowAccessor::new(sheet, row);
            let code = acc.text("id", project_cols::ID);
            if !is_project_code(&code) {
                continue;
            }
            report.projects += 1;
            if report.sample.len() < SAMPLE_SIZE {
                report.sample.push(ProjectSample {
                    name: acc.text("project_name", project_cols::NAME),
                    project_code: code.clone(),
                });
            }
            known_codes.insert(code);
        }
    }

    if let Some(sheet) = &workbook.status {
        report.status_rows = sheet
            .rows
            .iter()
            .filter(|row| {
                let code = RowAccessor::new(sheet, row).text("project", status_cols::PROJECT);
                !code.is_empty() && known_codes.contains(&code)
            })
            .count();
    }

    if let Some(sheet) = &workbook.risks {
        report.risks = sheet
            .rows
            .iter()
            .filter(|row| is_risk_code(&RowAccessor::new(sheet, row).text("id", risk_cols::ID)))
            .count();
    }

    if let Some(sheet) = &workbook.changes {
        report.changes = sheet
            .rows
            .iter()
            .filter(|row| {
                is_change_code(&RowAccessor::new(sheet, row).text("change_id", change_cols::ID))
            })
            .count();
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_code_pattern() {
        assert!(is_project_code("PRISM-001"));
        assert!(is_project_code("ab-9"));
        assert!(!is_project_code("PRISM001"));
        assert!(!is_project_code("PRISM-"));
        assert!(!is_project_code("-001"));
        assert!(!is_project_code(""));
        assert!(!is_project_code("Total"));
    }

    #[test]
    fn test_risk_and_change_patterns() {
        assert!(is_risk_code("RISK-007"));
        assert!(!is_risk_code("risk-007"));
        assert!(!is_risk_code("RISK-"));
        assert!(is_change_code("CHG-12"));
        assert!(!is_change_code("CHANGE-12"));
    }
}
