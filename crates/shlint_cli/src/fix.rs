//! Fix summary reporting

use std::path::{Path, PathBuf};

use shlint_core::{LintEntry, TextEdit};

/// Summary of applied fixes.
#[derive(Debug, Default)]
pub struct FixSummary {
    pub total_fixes: usize,
    pub files_fixed: usize,
    pub fixes_by_file: Vec<(PathBuf, usize)>,
}

impl FixSummary {
    pub fn record(&mut self, path: &Path, fixes: usize) {
        if fixes == 0 {
            return;
        }
        self.total_fixes += fixes;
        self.files_fixed += 1;
        self.fixes_by_file.push((path.to_path_buf(), fixes));
    }
}

/// Number of entries whose preferred fix made it into `edits`.
pub fn count_fixed(entries: &[LintEntry], edits: &[TextEdit]) -> usize {
    entries
        .iter()
        .filter_map(LintEntry::preferred_edit)
        .filter(|fix| !fix.is_empty() && fix.iter().all(|edit| edits.contains(edit)))
        .count()
}

/// Outputs the fix summary.
pub fn output_fix_summary(summary: &FixSummary, dry_run: bool) {
    if summary.total_fixes == 0 {
        println!("No fixable issues found.");
        return;
    }

    let action = if dry_run { "Would fix" } else { "Fixed" };
    println!(
        "\n{} {} issues in {} files:",
        action, summary.total_fixes, summary.files_fixed
    );
    for (path, count) in &summary.fixes_by_file {
        println!("  {}: {} fixes", path.display(), count);
    }
}
