//! JSON reporter
//!
//! Outputs the full Report as pretty-printed JSON. File summaries keep the
//! field names existing report consumers read (`filename`, `file_url`,
//! `errors`, `line_number`, `error_string`).

use crate::models::Report;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
