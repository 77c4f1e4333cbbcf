//! Text output formatter

use super::FileReport;

pub fn output_text(reports: &[FileReport]) {
    for report in reports {
        if report.entries.is_empty() {
            continue;
        }

        println!("\n{}:", report.path.display());
        for entry in &report.entries {
            let diag = &entry.diagnostic;
            println!(
                "  {}:{} {} [{}]: {}",
                diag.range.start.line + 1,
                diag.range.start.character + 1,
                diag.severity.as_str(),
                diag.rule_id(),
                diag.message
            );
        }
    }

    let total_files = reports.len();
    let total_issues: usize = reports.iter().map(|r| r.entries.len()).sum();

    println!();
    println!("Checked {} files, found {} issues", total_files, total_issues);
}
