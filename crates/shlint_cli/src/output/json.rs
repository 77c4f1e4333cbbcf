//! JSON output formatter

use miette::{IntoDiagnostic, Result};

use super::FileReport;

pub fn output_json(reports: &[FileReport]) -> Result<()> {
    let output: Vec<_> = reports
        .iter()
        .map(|r| {
            let diagnostics: Vec<_> = r.entries.iter().map(|e| &e.diagnostic).collect();
            serde_json::json!({
                "path": r.path.display().to_string(),
                "diagnostics": diagnostics,
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}
