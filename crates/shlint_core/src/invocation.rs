//! Building and running a single ShellCheck invocation.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::LintSettings;
use crate::parser::OutputFormat;
use crate::tool::{UnavailableReason, classify_failure, classify_spawn_error};
use crate::LinterError;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Builds the argument list for linting one document read from stdin.
///
/// Order: format, exclusions, shell dialect, user arguments, then `-`.
pub fn build_args(
    settings: &LintSettings,
    format: OutputFormat,
    file_name: Option<&Path>,
) -> Vec<String> {
    let mut args = vec!["-f".to_string(), format.as_arg().to_string()];

    if !settings.exclude.is_empty() {
        args.push("-e".to_string());
        args.push(settings.exclude.join(","));
    }

    if let Some(shell) = file_name.and_then(shell_dialect) {
        args.push(format!("--shell={}", shell));
    }

    args.extend(settings.custom_args.iter().cloned());
    args.push("-".to_string());
    args
}

/// Shell dialect implied by a file extension.
pub fn shell_dialect(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "bash" => Some("bash"),
        "ksh" => Some("ksh"),
        "dash" => Some("dash"),
        _ => None,
    }
}

/// Picks the working directory for the process.
///
/// Uses the workspace root when configured and known, otherwise the
/// document's directory. Returns `None` when that directory does not exist.
pub fn resolve_cwd(
    settings: &LintSettings,
    document_path: Option<&Path>,
    workspace_root: Option<&Path>,
) -> Option<PathBuf> {
    let candidate = match workspace_root {
        Some(root) if settings.use_workspace_root_as_cwd => Some(root.to_path_buf()),
        _ => document_path.and_then(Path::parent).map(Path::to_path_buf),
    }?;

    candidate.is_dir().then_some(candidate)
}

/// Converts CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Runs the tool with `text` on stdin and collects its output.
///
/// A non-zero exit is only an error when the tool printed nothing on stdout
/// and something on stderr; ShellCheck exits non-zero whenever it reports
/// findings.
pub async fn run_tool(
    executable: &Path,
    args: &[String],
    cwd: Option<&Path>,
    text: &str,
) -> Result<ToolOutput, LinterError> {
    let mut command = Command::new(executable);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    debug!("Running {} {}", executable.display(), args.join(" "));
    let mut child = command
        .spawn()
        .map_err(|e| spawn_failure(executable, &e))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| LinterError::execution("stdin was not captured"))?;
    let input = text.as_bytes().to_vec();
    let writer = tokio::spawn(async move {
        stdin.write_all(&input).await?;
        stdin.shutdown().await
    });

    let output = child.wait_with_output().await?;

    match writer.await {
        Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => {
            warn!("Failed to write document to stdin: {}", e);
        }
        Err(e) => warn!("Stdin writer task failed: {}", e),
        _ => {}
    }

    let result = ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
    };

    if !output.status.success()
        && result.stdout.trim().is_empty()
        && !result.stderr.trim().is_empty()
    {
        let stderr = result.stderr.trim();
        return Err(match classify_failure(result.exit_code, stderr) {
            UnavailableReason::NotFound => LinterError::ToolNotFound {
                path: executable.to_path_buf(),
            },
            UnavailableReason::ExecutionFailed => LinterError::execution(stderr),
        });
    }

    Ok(result)
}

fn spawn_failure(executable: &Path, err: &io::Error) -> LinterError {
    match classify_spawn_error(err) {
        UnavailableReason::NotFound => LinterError::ToolNotFound {
            path: executable.to_path_buf(),
        },
        UnavailableReason::ExecutionFailed => {
            LinterError::execution(format!("failed to start {}: {}", executable.display(), err))
        }
    }
}
