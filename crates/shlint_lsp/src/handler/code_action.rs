//! Code action handler for quick fixes and fix-all.

use std::collections::HashMap;

use serde_json::json;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::debug;

use shlint_core::{ActionKind, LintEntry};

use super::commands::{DISABLE_CHECK_FOR_LINE, OPEN_RULE_DOC};
use crate::conversion::{from_lsp_range, to_lsp_diagnostic, to_lsp_edit};
use crate::state::{BackendState, document_key};

/// Code action kind of the combined fix.
pub const FIX_ALL_KIND: &str = "source.fixAll.shellcheck";

pub const FIX_ALL_TITLE: &str = "Fix all ShellCheck issues";

/// Handles the `textDocument/codeAction` request.
pub fn handle_code_action(
    state: &BackendState,
    params: CodeActionParams,
) -> Result<Option<CodeActionResponse>> {
    debug!("Code action request: {}", params.text_document.uri);

    let uri = &params.text_document.uri;
    if !state.is_open(uri) {
        return Ok(None);
    }
    let key = document_key(uri);

    let fix_all_kind = CodeActionKind::new(FIX_ALL_KIND);
    let (wants_fix_all, wants_quickfix) = match &params.context.only {
        Some(only) => (
            is_requested(only, &fix_all_kind),
            is_requested(only, &CodeActionKind::QUICKFIX),
        ),
        None => (true, true),
    };

    let mut actions = Vec::new();

    if wants_quickfix {
        let entries = state.diagnostics.entries_in(&key, &from_lsp_range(params.range));
        for entry in &entries {
            add_entry_actions(entry, uri, &mut actions);
        }
    }

    if wants_fix_all {
        let edits = state.diagnostics.fix_all(&key);
        if !edits.is_empty() {
            let changes = HashMap::from([(uri.clone(), edits.iter().map(to_lsp_edit).collect())]);
            actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                title: FIX_ALL_TITLE.to_string(),
                kind: Some(fix_all_kind),
                edit: Some(WorkspaceEdit {
                    changes: Some(changes),
                    ..Default::default()
                }),
                ..Default::default()
            }));
        }
    }

    Ok(Some(actions))
}

/// Kinds are hierarchical: asking for `source` also covers `source.fixAll`.
fn is_requested(only: &[CodeActionKind], kind: &CodeActionKind) -> bool {
    only.iter().any(|requested| {
        let requested = requested.as_str();
        let kind = kind.as_str();
        kind == requested
            || kind
                .strip_prefix(requested)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

fn add_entry_actions(entry: &LintEntry, uri: &Url, actions: &mut Vec<CodeActionOrCommand>) {
    let diagnostic = to_lsp_diagnostic(&entry.diagnostic);

    for action in &entry.actions {
        let mut code_action = CodeAction {
            title: action.title.clone(),
            kind: Some(CodeActionKind::QUICKFIX),
            diagnostics: Some(vec![diagnostic.clone()]),
            is_preferred: action.is_preferred.then_some(true),
            ..Default::default()
        };

        match &action.kind {
            ActionKind::QuickFix(edits) => {
                code_action.edit = Some(WorkspaceEdit {
                    changes: Some(HashMap::from([(
                        uri.clone(),
                        edits.iter().map(to_lsp_edit).collect(),
                    )])),
                    ..Default::default()
                });
            }
            ActionKind::OpenRuleDoc { .. } => {
                code_action.command = Some(Command {
                    title: action.title.clone(),
                    command: OPEN_RULE_DOC.to_string(),
                    arguments: Some(vec![json!(entry.rule_id())]),
                });
            }
            ActionKind::DisableForLine { line, rule_id } => {
                code_action.command = Some(Command {
                    title: action.title.clone(),
                    command: DISABLE_CHECK_FOR_LINE.to_string(),
                    arguments: Some(vec![json!(uri), json!(line), json!(rule_id)]),
                });
            }
        }

        actions.push(CodeActionOrCommand::CodeAction(code_action));
    }
}
