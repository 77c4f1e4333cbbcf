//! Document lifecycle handlers (open, change, save, close).

use tower_lsp::lsp_types::*;
use tracing::debug;

use crate::state::{BackendState, DocumentData};

/// Handles the `textDocument/didOpen` notification.
pub fn handle_did_open(state: &BackendState, params: DidOpenTextDocumentParams) -> Url {
    debug!("Document opened: {}", params.text_document.uri);

    let doc = params.text_document;
    state.documents.write().insert(
        doc.uri.clone(),
        DocumentData {
            text: doc.text,
            version: doc.version,
            language_id: doc.language_id,
            settings: state.current_settings(),
            generation: state.next_generation(),
        },
    );
    doc.uri
}

/// Handles the `textDocument/didChange` notification.
///
/// Returns the URI when a tracked document was updated.
pub fn handle_did_change(state: &BackendState, params: DidChangeTextDocumentParams) -> Option<Url> {
    debug!("Document changed: {}", params.text_document.uri);

    // FULL sync: the last change carries the whole text.
    let change = params.content_changes.into_iter().last()?;
    let uri = params.text_document.uri;

    let mut docs = state.documents.write();
    let doc = docs.get_mut(&uri)?;
    // Notifications may be handled concurrently; never step back in time.
    if params.text_document.version < doc.version {
        debug!(
            "Ignoring stale change {} < {} for {}",
            params.text_document.version, doc.version, uri
        );
        return None;
    }
    doc.text = change.text;
    doc.version = params.text_document.version;
    Some(uri)
}

/// Handles the `textDocument/didSave` notification.
pub fn handle_did_save(state: &BackendState, params: DidSaveTextDocumentParams) -> Option<Url> {
    debug!("Document saved: {}", params.text_document.uri);

    let uri = params.text_document.uri;
    let mut docs = state.documents.write();
    let doc = docs.get_mut(&uri)?;
    if let Some(text) = params.text {
        doc.text = text;
    }
    Some(uri)
}

/// Handles the `textDocument/didClose` notification.
pub fn handle_did_close(state: &BackendState, params: DidCloseTextDocumentParams) -> Url {
    debug!("Document closed: {}", params.text_document.uri);

    state.close(&params.text_document.uri);
    params.text_document.uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BackendOptions;
    use pretty_assertions::assert_eq;

    fn open(state: &BackendState, uri: &Url) {
        handle_did_open(
            state,
            DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri.clone(),
                    language_id: "shellscript".to_string(),
                    version: 1,
                    text: "echo a\n".to_string(),
                },
            },
        );
    }

    #[test]
    fn test_change_keeps_last_full_text() {
        let state = BackendState::new(BackendOptions::default());
        let uri = Url::parse("file:///tmp/a.sh").unwrap();
        open(&state, &uri);

        let updated = handle_did_change(
            &state,
            DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: uri.clone(),
                    version: 2,
                },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: "echo b\n".to_string(),
                }],
            },
        );

        assert_eq!(updated, Some(uri.clone()));
        let doc = state.document(&uri).unwrap();
        assert_eq!(doc.text, "echo b\n");
        assert_eq!(doc.version, 2);
    }

    #[test]
    fn test_change_for_unknown_document() {
        let state = BackendState::new(BackendOptions::default());
        let uri = Url::parse("file:///tmp/unknown.sh").unwrap();
        let updated = handle_did_change(
            &state,
            DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier { uri, version: 2 },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: "x".to_string(),
                }],
            },
        );
        assert_eq!(updated, None);
    }

    #[test]
    fn test_stale_change_is_ignored() {
        let state = BackendState::new(BackendOptions::default());
        let uri = Url::parse("file:///tmp/a.sh").unwrap();
        open(&state, &uri);

        let change = |version: i32, text: &str| DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.clone(),
                version,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: text.to_string(),
            }],
        };

        assert!(handle_did_change(&state, change(3, "echo new\n")).is_some());
        assert_eq!(handle_did_change(&state, change(2, "echo old\n")), None);
        assert_eq!(state.document(&uri).unwrap().text, "echo new\n");
    }

    #[test]
    fn test_save_with_text() {
        let state = BackendState::new(BackendOptions::default());
        let uri = Url::parse("file:///tmp/a.sh").unwrap();
        open(&state, &uri);

        handle_did_save(
            &state,
            DidSaveTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                text: Some("echo saved\n".to_string()),
            },
        );
        assert_eq!(state.document(&uri).unwrap().text, "echo saved\n");
    }
}
