//! Check command implementation

use std::fs;
use std::path::PathBuf;

use miette::{IntoDiagnostic, Result, miette};
use tracing::{debug, info, warn};

use shlint_core::invocation::normalize_line_endings;
use shlint_core::tool::{RECOMMENDED_VERSION, needs_upgrade};
use shlint_core::{
    LintRequest, LintSettings, OutputFormat as ToolFormat, Settings, ToolHealth, ToolStatus,
    UnavailableReason, apply_edits, fix_all, lint_text,
};

use crate::cli::{Cli, OutputFormat};
use crate::fix::{FixSummary, count_fixed, output_fix_summary};
use crate::output::{FileReport, output_reports};
use crate::utils::create_tokio_runtime;

pub fn run_check(
    cli: &Cli,
    files: &[PathBuf],
    format: OutputFormat,
    fix: bool,
    dry_run: bool,
) -> Result<bool> {
    let settings = load_settings(cli)?;
    let settings = LintSettings::resolve(&settings).into_diagnostic()?;

    let runtime = create_tokio_runtime()?;
    let (reports, summary) = runtime.block_on(check_files(&settings, files, fix, dry_run))?;

    let has_errors = output_reports(&reports, format)?;
    if fix && format == OutputFormat::Text {
        output_fix_summary(&summary, dry_run);
    }
    Ok(has_errors)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path).into_diagnostic()?,
        None => {
            let cwd = std::env::current_dir().into_diagnostic()?;
            match Settings::discover(&cwd) {
                Some(path) => {
                    info!("Using config file: {}", path.display());
                    Settings::from_file(&path).into_diagnostic()?
                }
                None => Settings::default(),
            }
        }
    };

    if let Some(executable) = &cli.executable {
        settings.executable_path = executable.to_string_lossy().into_owned();
    }
    Ok(settings)
}

async fn check_files(
    settings: &LintSettings,
    files: &[PathBuf],
    fix: bool,
    dry_run: bool,
) -> Result<(Vec<FileReport>, FixSummary)> {
    let executable = &settings.executable.path;
    let version = match ToolHealth::new().probe(executable).await.into_diagnostic()? {
        ToolStatus::Ready(version) => version,
        ToolStatus::Unavailable(UnavailableReason::NotFound) => {
            return Err(miette!(
                help = "Install ShellCheck or pass --executable",
                "ShellCheck executable not found: {}",
                executable.display()
            ));
        }
        ToolStatus::Unavailable(UnavailableReason::ExecutionFailed) => {
            return Err(miette!("ShellCheck at {} failed to run", executable.display()));
        }
    };
    debug!("Using ShellCheck {}", version);

    if !settings.disable_version_check && needs_upgrade(&version) {
        warn!(
            "ShellCheck {} is older than the recommended {}",
            version, RECOMMENDED_VERSION
        );
    }

    let format = ToolFormat::select(&version, settings.enable_quick_fix || fix);
    if fix && format == ToolFormat::Json {
        warn!("ShellCheck {} does not report fixes, nothing will be fixed", version);
    }
    let workspace_root = std::env::current_dir().ok();

    let mut reports = Vec::with_capacity(files.len());
    let mut summary = FixSummary::default();

    for path in files {
        if settings.is_ignored_path(path) {
            info!("Skipping ignored file: {}", path.display());
            continue;
        }

        let content = fs::read_to_string(path)
            .map_err(|e| miette!("Failed to read {}: {}", path.display(), e))?;
        let mut request = LintRequest {
            text: normalize_line_endings(&content).into_owned(),
            document_path: Some(path.clone()),
            workspace_root: workspace_root.clone(),
        };
        let mut entries = lint_text(settings, format, &request)
            .await
            .into_diagnostic()?;

        if fix {
            let edits = fix_all(&entries);
            if !edits.is_empty() {
                summary.record(path, count_fixed(&entries, &edits));
                let fixed = apply_edits(&request.text, &edits);
                if !dry_run {
                    fs::write(path, &fixed)
                        .map_err(|e| miette!("Failed to write {}: {}", path.display(), e))?;
                }

                // Report what is left after fixing.
                request.text = fixed;
                entries = lint_text(settings, format, &request)
                    .await
                    .into_diagnostic()?;
            }
        }

        reports.push(FileReport {
            path: path.clone(),
            entries,
        });
    }

    Ok((reports, summary))
}
