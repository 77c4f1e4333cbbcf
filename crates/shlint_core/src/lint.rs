//! One complete lint pass: invoke the tool and parse what it reports.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::LinterError;
use crate::config::LintSettings;
use crate::diagnostic::LintEntry;
use crate::invocation::{build_args, normalize_line_endings, resolve_cwd, run_tool};
use crate::parser::{OutputFormat, parse_output};

/// A document to lint.
#[derive(Debug, Clone, Default)]
pub struct LintRequest {
    /// Current document content.
    pub text: String,
    /// Path on disk, when the document has one.
    pub document_path: Option<PathBuf>,
    pub workspace_root: Option<PathBuf>,
}

impl LintRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.document_path = Some(path.into());
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }
}

/// Runs the tool on `request.text` and returns its findings.
///
/// Positions in the result refer to the text with line endings normalized
/// to LF, which is what the tool is given.
pub async fn lint_text(
    settings: &LintSettings,
    format: OutputFormat,
    request: &LintRequest,
) -> Result<Vec<LintEntry>, LinterError> {
    let document_path = request.document_path.as_deref();
    let args = build_args(settings, format, document_path);
    let cwd = resolve_cwd(settings, document_path, request.workspace_root.as_deref());
    let text = normalize_line_endings(&request.text);

    debug!(
        "Linting {} ({} bytes)",
        document_path.map_or_else(|| "<stdin>".into(), |p| p.display().to_string()),
        text.len()
    );

    let output = run_tool(&settings.executable.path, &args, cwd.as_deref(), &text).await?;
    let entries = parse_output(format, &output.stdout, &text)?;

    info!("Found {} issues", entries.len());
    Ok(entries)
}
