//! Output formatting module

mod json;
mod text;

use std::path::PathBuf;

use miette::Result;
use shlint_core::{LintEntry, Severity};

use crate::cli::OutputFormat;

/// Findings for one checked file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub entries: Vec<LintEntry>,
}

impl FileReport {
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.diagnostic.severity == Severity::Error)
    }
}

/// Prints the reports. Returns true if any error-level finding remains.
pub fn output_reports(reports: &[FileReport], format: OutputFormat) -> Result<bool> {
    let has_errors = reports.iter().any(FileReport::has_errors);

    match format {
        OutputFormat::Json => json::output_json(reports)?,
        OutputFormat::Text => text::output_text(reports),
    }

    Ok(has_errors)
}
