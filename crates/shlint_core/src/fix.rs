//! Fix-all aggregation and edit application.

use tracing::{debug, warn};

use crate::diagnostic::{LintEntry, Position, TextEdit, TextRange};

/// Combines the preferred quick fixes of `entries` into one edit list.
///
/// Entries are scanned once in discovery order. An entry's edits are taken
/// only if none of them overlap an edit already taken; otherwise the whole
/// entry is dropped. The result never contains overlapping ranges.
pub fn fix_all(entries: &[LintEntry]) -> Vec<TextEdit> {
    let mut accepted: Vec<TextRange> = Vec::new();
    let mut edits = Vec::new();

    for entry in entries {
        let Some(candidate) = entry.preferred_edit() else {
            continue;
        };
        if candidate.is_empty() {
            continue;
        }

        let conflicts = candidate
            .iter()
            .any(|edit| accepted.iter().any(|range| range.overlaps(&edit.range)));

        if conflicts {
            warn!(
                "Skipping overlapping fix for {} at {}:{}",
                entry.rule_id(),
                entry.diagnostic.range.start.line + 1,
                entry.diagnostic.range.start.character + 1
            );
            continue;
        }

        accepted.extend(candidate.iter().map(|edit| edit.range));
        edits.extend(candidate.iter().cloned());
    }

    edits
}

/// Applies edits to `text` as if they were applied simultaneously.
///
/// Edits are applied from the end of the text to the beginning to avoid
/// offset shifting. Insertions at the same position keep their given order.
/// Edits that overlap an already applied edit, or point outside the text,
/// are skipped.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut resolved: Vec<(usize, usize, usize, &TextEdit)> = Vec::with_capacity(edits.len());
    for (index, edit) in edits.iter().enumerate() {
        match (
            position_to_offset(text, edit.range.start),
            position_to_offset(text, edit.range.end),
        ) {
            (Some(start), Some(end)) if start <= end => resolved.push((start, end, index, edit)),
            _ => warn!(
                "Invalid edit range: {:?}, content_len={}",
                edit.range,
                text.len()
            ),
        }
    }

    // Descending by start; for equal starts the later edit goes first so the
    // earlier one ends up in front of it.
    resolved.sort_by(|a, b| b.0.cmp(&a.0).then(b.2.cmp(&a.2)));

    let mut result = text.to_string();
    // Smallest start among applied edits; everything applied so far lies at
    // or after it.
    let mut lowest_start = usize::MAX;

    for (start, end, _, edit) in resolved {
        if end > lowest_start {
            warn!("Skipping overlapping edit at [{}, {}]", start, end);
            continue;
        }

        debug!("Applying edit: replace [{}..{}] with '{}'", start, end, edit.new_text);
        result.replace_range(start..end, &edit.new_text);
        lowest_start = start;
    }

    result
}

/// Converts a line/UTF-16 column position into a byte offset.
pub(crate) fn position_to_offset(text: &str, position: Position) -> Option<usize> {
    let mut line_start = 0usize;
    for _ in 0..position.line {
        let newline = text[line_start..].find('\n')?;
        line_start += newline + 1;
    }

    let line_end = text[line_start..]
        .find('\n')
        .map_or(text.len(), |i| line_start + i);
    let line = &text[line_start..line_end];

    let mut units = 0u32;
    for (byte, ch) in line.char_indices() {
        if units >= position.character {
            return (units == position.character).then_some(line_start + byte);
        }
        units += ch.len_utf16() as u32;
    }
    (units == position.character).then_some(line_end)
}
