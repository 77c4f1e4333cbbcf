//! Document links from suppression directives to the ShellCheck wiki.

use tower_lsp::lsp_types::*;
use tracing::debug;

use shlint_core::links::find_rule_links;

use crate::conversion::to_lsp_range;
use crate::state::BackendState;

/// Handles the `textDocument/documentLink` request.
pub fn handle_document_link(
    state: &BackendState,
    params: DocumentLinkParams,
) -> Option<Vec<DocumentLink>> {
    debug!("Document link request: {}", params.text_document.uri);

    let doc = state.document(&params.text_document.uri)?;
    let links = find_rule_links(&doc.text)
        .into_iter()
        .filter_map(|link| {
            Some(DocumentLink {
                range: to_lsp_range(link.range),
                target: Some(Url::parse(&link.url).ok()?),
                tooltip: Some(format!("Open the ShellCheck wiki for SC{}", link.code)),
                data: None,
            })
        })
        .collect();
    Some(links)
}
