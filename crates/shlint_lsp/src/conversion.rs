//! LSP type conversion utilities.

use tower_lsp::lsp_types::{
    CodeDescription, Diagnostic, DiagnosticSeverity, DiagnosticTag, NumberOrString, Position,
    Range, TextEdit, Url,
};

use shlint_core::{
    Diagnostic as ShellDiagnostic, DiagnosticTag as ShellTag, Position as ShellPosition,
    Severity as ShellSeverity, TextEdit as ShellEdit, TextRange,
};

pub const SOURCE: &str = "shellcheck";

/// Converts a ShellCheck finding to an LSP diagnostic.
pub fn to_lsp_diagnostic(diag: &ShellDiagnostic) -> Diagnostic {
    let severity = match diag.severity {
        ShellSeverity::Error => DiagnosticSeverity::ERROR,
        ShellSeverity::Warning => DiagnosticSeverity::WARNING,
        ShellSeverity::Info => DiagnosticSeverity::INFORMATION,
        ShellSeverity::Style => DiagnosticSeverity::HINT,
    };

    let tags: Vec<DiagnosticTag> = diag
        .tags
        .iter()
        .map(|tag| match tag {
            ShellTag::Unnecessary => DiagnosticTag::UNNECESSARY,
            ShellTag::Deprecated => DiagnosticTag::DEPRECATED,
        })
        .collect();

    Diagnostic {
        range: to_lsp_range(diag.range),
        severity: Some(severity),
        code: Some(NumberOrString::String(diag.rule_id())),
        code_description: Url::parse(&diag.wiki_url())
            .ok()
            .map(|href| CodeDescription { href }),
        source: Some(SOURCE.to_string()),
        message: diag.message.clone(),
        tags: (!tags.is_empty()).then_some(tags),
        ..Default::default()
    }
}

pub fn to_lsp_position(pos: ShellPosition) -> Position {
    Position::new(pos.line, pos.character)
}

pub fn to_lsp_range(range: TextRange) -> Range {
    Range::new(to_lsp_position(range.start), to_lsp_position(range.end))
}

pub fn from_lsp_range(range: Range) -> TextRange {
    TextRange::new(
        ShellPosition::new(range.start.line, range.start.character),
        ShellPosition::new(range.end.line, range.end.character),
    )
}

pub fn to_lsp_edit(edit: &ShellEdit) -> TextEdit {
    TextEdit {
        range: to_lsp_range(edit.range),
        new_text: edit.new_text.clone(),
    }
}
