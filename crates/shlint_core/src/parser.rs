//! Decoding ShellCheck's JSON output into lint entries.

use semver::Version;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::LinterError;
use crate::diagnostic::{
    ActionKind, Diagnostic, DiagnosticTag, Fix, LintAction, LintEntry, Position, Severity,
    TextEdit, TextRange,
};

const UNNECESSARY_CODES: &[u32] = &[2034];
const DEPRECATED_CODES: &[u32] = &[2006, 2007];

/// Output format requested from ShellCheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A bare array of comments. Columns expand tabs to stops of 8.
    Json,
    /// An object with a `comments` array; carries fix data. Columns count a
    /// tab as one character.
    Json1,
}

impl OutputFormat {
    /// First release that understands `-f json1`.
    pub const JSON1_MIN_VERSION: Version = Version::new(0, 7, 0);

    /// Picks the richer format when the tool supports it and fixes are wanted.
    pub fn select(version: &Version, enable_quick_fix: bool) -> Self {
        if enable_quick_fix && *version >= Self::JSON1_MIN_VERSION {
            Self::Json1
        } else {
            Self::Json
        }
    }

    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Json1 => "json1",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Json1Output {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Comment {
    line: u32,
    #[serde(default)]
    end_line: Option<u32>,
    column: u32,
    #[serde(default)]
    end_column: Option<u32>,
    level: String,
    code: u32,
    message: String,
    #[serde(default)]
    fix: Option<CommentFix>,
}

#[derive(Debug, Deserialize)]
struct CommentFix {
    #[serde(default)]
    replacements: Vec<Replacement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Replacement {
    line: u32,
    end_line: u32,
    column: u32,
    end_column: u32,
    #[serde(default)]
    precedence: i32,
    replacement: String,
}

/// Parses raw tool output for the document `text`.
///
/// Empty output means no findings. `text` must be the exact text sent to the
/// tool; it is used to translate columns into UTF-16 code units.
pub fn parse_output(
    format: OutputFormat,
    stdout: &str,
    text: &str,
) -> Result<Vec<LintEntry>, LinterError> {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(Vec::new());
    }

    let comments = match format {
        OutputFormat::Json => serde_json::from_str::<Vec<Comment>>(stdout),
        OutputFormat::Json1 => serde_json::from_str::<Json1Output>(stdout).map(|o| o.comments),
    }
    .map_err(|e| LinterError::parse(format!("invalid {} output: {}", format.as_arg(), e)))?;

    let lines = LineIndex::new(text, format);
    let entries = comments
        .into_iter()
        .filter_map(|comment| to_entry(comment, format, &lines))
        .collect::<Vec<_>>();

    debug!("Parsed {} findings", entries.len());
    Ok(entries)
}

fn to_entry(
    comment: Comment,
    format: OutputFormat,
    lines: &LineIndex<'_>,
) -> Option<LintEntry> {
    let Some(severity) = Severity::from_level(&comment.level) else {
        warn!("Unknown level '{}' for SC{}", comment.level, comment.code);
        return None;
    };

    let start = lines.position(comment.line, comment.column);
    let end = lines.position(
        comment.end_line.unwrap_or(comment.line),
        comment.end_column.unwrap_or(comment.column),
    );
    let mut range = TextRange::new(start, end.max(start));
    if range.is_empty() {
        range = lines.widen(range.start);
    }

    let mut diagnostic = Diagnostic::new(comment.code, comment.message, range)
        .with_severity(severity);
    if UNNECESSARY_CODES.contains(&comment.code) {
        diagnostic.tags.push(DiagnosticTag::Unnecessary);
    }
    if DEPRECATED_CODES.contains(&comment.code) {
        diagnostic.tags.push(DiagnosticTag::Deprecated);
    }

    // Fix data is only trusted from json1, which is requested only when
    // quick fixes are enabled.
    if let Some(fix) = comment.fix.filter(|_| format == OutputFormat::Json1) {
        let mut replacements = fix.replacements;
        // Higher precedence first; ties keep the order ShellCheck gave.
        replacements.sort_by(|a, b| b.precedence.cmp(&a.precedence));
        let edits: Vec<TextEdit> = replacements
            .into_iter()
            .map(|r| {
                let start = lines.position(r.line, r.column);
                let end = lines.position(r.end_line, r.end_column);
                TextEdit::new(TextRange::new(start, end.max(start)), r.replacement)
            })
            .collect();
        if !edits.is_empty() {
            diagnostic = diagnostic.with_fix(Fix { edits });
        }
    }

    let actions = actions_for(&diagnostic);
    Some(LintEntry {
        diagnostic,
        actions,
    })
}

fn actions_for(diagnostic: &Diagnostic) -> Vec<LintAction> {
    let rule_id = diagnostic.rule_id();
    let mut actions = Vec::with_capacity(3);

    if let Some(fix) = &diagnostic.fix {
        actions.push(LintAction {
            title: format!("Apply fix for {}", rule_id),
            kind: ActionKind::QuickFix(fix.edits.clone()),
            is_preferred: true,
        });
    }

    actions.push(LintAction {
        title: format!("Show wiki for {}", rule_id),
        kind: ActionKind::OpenRuleDoc {
            url: diagnostic.wiki_url(),
        },
        is_preferred: false,
    });

    actions.push(LintAction {
        title: format!("Disable {} for this line", rule_id),
        kind: ActionKind::DisableForLine {
            line: diagnostic.range.start.line,
            rule_id,
        },
        is_preferred: false,
    });

    actions
}

/// Tab stop width of the legacy `json` format.
const TAB_WIDTH: u32 = 8;

/// Maps ShellCheck's 1-based character positions onto the document.
struct LineIndex<'a> {
    lines: Vec<&'a str>,
    tab_width: Option<u32>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str, format: OutputFormat) -> Self {
        Self {
            lines: text.split('\n').collect(),
            tab_width: match format {
                OutputFormat::Json => Some(TAB_WIDTH),
                OutputFormat::Json1 => None,
            },
        }
    }

    /// Converts a 1-based line and tool column into a 0-based position
    /// measured in UTF-16 code units.
    fn position(&self, line: u32, column: u32) -> Position {
        let line0 = line.saturating_sub(1);
        let col0 = column.saturating_sub(1);
        let Some(text) = self.lines.get(line0 as usize) else {
            return Position::new(line0, col0);
        };

        let mut col = 0u32;
        let mut units = 0u32;
        for c in text.chars() {
            if col >= col0 {
                break;
            }
            col += match (c, self.tab_width) {
                ('\t', Some(width)) => width - col % width,
                _ => 1,
            };
            units += c.len_utf16() as u32;
        }
        // columns past the end of the line
        units += col0.saturating_sub(col);
        Position::new(line0, units)
    }

    /// Expands an empty range to the word at `at`, or one character.
    fn widen(&self, at: Position) -> TextRange {
        let Some(text) = self.lines.get(at.line as usize) else {
            return TextRange::new(at, at);
        };

        let mut units = 0u32;
        let rest = text.chars().skip_while(|c| {
            let before = units < at.character;
            if before {
                units += c.len_utf16() as u32;
            }
            before
        });

        let mut end = at.character;
        let mut first = true;
        for c in rest {
            let word = c.is_alphanumeric() || c == '_';
            if first && !word {
                end += c.len_utf16() as u32;
                break;
            }
            if !word {
                break;
            }
            first = false;
            end += c.len_utf16() as u32;
        }

        TextRange::new(at, Position::new(at.line, end))
    }
}
