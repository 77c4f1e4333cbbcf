//! Suppression comments for a single line.

use crate::diagnostic::{Position, TextEdit};

/// Builds the edit that disables `rule_id` for `line`.
///
/// The directive is inserted directly above the line and reuses its leading
/// indentation, so the edited line keeps its own indentation too. Returns
/// `None` when `line` is past the end of the document.
pub fn disable_for_line(text: &str, line: u32, rule_id: &str) -> Option<TextEdit> {
    let line_text = text.lines().nth(line as usize).or_else(|| {
        // A trailing empty line (or an empty document) has no entry in `lines()`.
        let count = text.lines().count();
        (line as usize == count && (text.is_empty() || text.ends_with('\n'))).then_some("")
    })?;

    let indent: String = line_text
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    let column = indent.chars().map(|c| c.len_utf16() as u32).sum();

    Some(TextEdit::insert(
        Position::new(line, column),
        format!("# shellcheck disable={}\n{}", normalize_rule_id(rule_id), indent),
    ))
}

/// Normalizes `2086` or `sc2086` to `SC2086`.
pub fn normalize_rule_id(rule_id: &str) -> String {
    let trimmed = rule_id.trim();
    let digits = trimmed
        .strip_prefix("SC")
        .or_else(|| trimmed.strip_prefix("sc"))
        .unwrap_or(trimmed);
    format!("SC{}", digits)
}
