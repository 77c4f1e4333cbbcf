//! Diagnostic types for lint results.

use serde::{Deserialize, Serialize};

/// Severity level reported by ShellCheck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
    Style,
}

impl Severity {
    /// Parses ShellCheck's `level` field.
    pub fn from_level(level: &str) -> Option<Self> {
        match level {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            "style" => Some(Self::Style),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Style => "style",
        }
    }
}

/// Extra rendering hints attached to a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticTag {
    Unnecessary,
    Deprecated,
}

/// A zero-based line/column position. Columns are UTF-16 code units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open range `[start, end)` in a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true when `other` lies entirely within this range.
    pub fn contains(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true when applying edits on both ranges at once would conflict.
    ///
    /// Ranges that merely meet at a boundary do not overlap, except for two
    /// insertions at the same point, whose relative order is undefined.
    pub fn overlaps(&self, other: &TextRange) -> bool {
        if self.is_empty() && other.is_empty() {
            return self.start == other.start;
        }
        if self.is_empty() {
            return other.start < self.start && self.start < other.end;
        }
        if other.is_empty() {
            return self.start < other.start && other.start < self.end;
        }
        self.start < other.end && other.start < self.end
    }
}

/// A single text replacement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: TextRange,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(range: TextRange, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Creates an edit that inserts text at a position.
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::new(TextRange::new(at, at), text)
    }
}

/// A machine-applicable fix for one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fix {
    /// Replacements in application order.
    pub edits: Vec<TextEdit>,
}

/// A single finding reported by ShellCheck.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Numeric ShellCheck code, e.g. `2086`.
    pub code: u32,
    pub message: String,
    pub range: TextRange,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DiagnosticTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
}

impl Diagnostic {
    pub fn new(code: u32, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            code,
            message: message.into(),
            range,
            severity: Severity::Error,
            tags: Vec::new(),
            fix: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Rule identifier in `SC####` form.
    pub fn rule_id(&self) -> String {
        format!("SC{}", self.code)
    }

    /// Link to the rule's documentation page.
    pub fn wiki_url(&self) -> String {
        crate::links::wiki_url(self.code)
    }
}

/// What a code action does when chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Apply the diagnostic's fix.
    QuickFix(Vec<TextEdit>),
    /// Open the rule's documentation.
    OpenRuleDoc { url: String },
    /// Insert a `# shellcheck disable=` comment above the line.
    DisableForLine { line: u32, rule_id: String },
}

/// A user-facing action derived from a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintAction {
    pub title: String,
    pub kind: ActionKind,
    pub is_preferred: bool,
}

impl LintAction {
    /// The edit carried by this action, if any.
    pub fn edit(&self) -> Option<&[TextEdit]> {
        match &self.kind {
            ActionKind::QuickFix(edits) => Some(edits),
            _ => None,
        }
    }
}

/// A parsed diagnostic together with the actions offered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintEntry {
    pub diagnostic: Diagnostic,
    pub actions: Vec<LintAction>,
}

impl LintEntry {
    pub fn rule_id(&self) -> String {
        self.diagnostic.rule_id()
    }

    /// Returns true when this entry's range is identical to or contains the
    /// given cursor or selection.
    pub fn matches(&self, range: &TextRange) -> bool {
        self.diagnostic.range.contains(range)
    }

    /// The preferred quick fix edit, if one is offered.
    pub fn preferred_edit(&self) -> Option<&[TextEdit]> {
        self.actions
            .iter()
            .filter(|a| a.is_preferred)
            .find_map(LintAction::edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> TextRange {
        TextRange::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(0, 5) < Position::new(0, 10));
        assert!(Position::new(0, 10) < Position::new(1, 0));
        assert_eq!(Position::new(2, 3), Position::new(2, 3));
    }

    #[test]
    fn test_range_overlaps() {
        let a = range(0, 0, 0, 5);
        assert!(a.overlaps(&range(0, 4, 0, 8)));
        assert!(a.overlaps(&range(0, 1, 0, 2)));
        // adjacent ranges do not conflict
        assert!(!a.overlaps(&range(0, 5, 0, 8)));
        assert!(!a.overlaps(&range(1, 0, 1, 2)));
    }

    #[test]
    fn test_range_overlaps_insertions() {
        let at = range(0, 3, 0, 3);
        assert!(at.overlaps(&range(0, 3, 0, 3)));
        assert!(at.overlaps(&range(0, 0, 0, 5)));
        assert!(!at.overlaps(&range(0, 3, 0, 5)));
        assert!(!at.overlaps(&range(0, 0, 0, 3)));
    }

    #[test]
    fn test_entry_matches() {
        let entry = LintEntry {
            diagnostic: Diagnostic::new(2086, "Double quote", range(2, 4, 2, 9)),
            actions: Vec::new(),
        };
        assert!(entry.matches(&range(2, 4, 2, 9)));
        assert!(entry.matches(&range(2, 6, 2, 6)));
        assert!(entry.matches(&range(2, 9, 2, 9)));
        assert!(entry.matches(&range(2, 5, 2, 8)));
        assert!(!entry.matches(&range(3, 0, 3, 0)));
        // selections that only partly cover the entry
        assert!(!entry.matches(&range(2, 0, 2, 5)));
        assert!(!entry.matches(&range(2, 8, 2, 12)));
        assert!(!entry.matches(&range(2, 0, 2, 12)));
        assert_eq!(entry.rule_id(), "SC2086");
    }

    #[test]
    fn test_severity_from_level() {
        assert_eq!(Severity::from_level("style"), Some(Severity::Style));
        assert_eq!(Severity::from_level("info"), Some(Severity::Info));
        assert_eq!(Severity::from_level("fatal"), None);
    }
}
