//! shlint LSP Server
//!
//! Language Server Protocol front end for ShellCheck.
//! Keeps diagnostics of open shell scripts in sync with their text.

mod conversion;
mod handler;
mod state;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, error, info, warn};

use shlint_core::suppress::disable_for_line;
use shlint_core::tool::{RECOMMENDED_VERSION, needs_upgrade};
use shlint_core::{
    Completion, DocumentInfo, LintEvent, LintRequest, LintSettings, LinterError, OutputFormat,
    Settings, ToolStatus, TriggerDecision, UnavailableReason, lint_text, should_lint,
};

use crate::conversion::{to_lsp_diagnostic, to_lsp_edit};
use crate::handler::Command as ServerCommand;
use crate::prompts::{DONT_SHOW_AGAIN, INSTALLATION_GUIDE, INSTALLATION_URL, OPEN_SETTINGS};
use crate::state::BackendState;

pub use crate::state::BackendOptions;

/// Labels and links used in user-facing prompts.
mod prompts {
    pub const OPEN_SETTINGS: &str = "Open settings";
    pub const INSTALLATION_GUIDE: &str = "Installation guide";
    pub const INSTALLATION_URL: &str = "https://github.com/koalaman/shellcheck#installing";
    pub const DONT_SHOW_AGAIN: &str = "Don't show again";
}

/// The LSP backend for shlint.
#[derive(Clone)]
pub struct Backend {
    /// LSP client for sending notifications.
    client: Client,
    /// Shared state
    state: Arc<BackendState>,
}

impl Backend {
    /// Creates a new backend with the given client.
    pub fn new(client: Client) -> Self {
        Self::with_options(client, BackendOptions::from_environment())
    }

    pub fn with_options(client: Client, options: BackendOptions) -> Self {
        Self {
            client,
            state: Arc::new(BackendState::new(options)),
        }
    }

    /// Runs the trigger policy for `uri` and schedules a lint if it says so.
    ///
    /// The returned completion resolves once the run absorbing this event is
    /// done; callers that do not care may drop it.
    async fn schedule_lint(&self, uri: Url, event: LintEvent) -> Option<Completion<()>> {
        let decision = {
            let docs = self.state.documents.read();
            let doc = docs.get(&uri)?;
            let path = uri.to_file_path().ok();
            let info = DocumentInfo {
                uri_scheme: uri.scheme(),
                path: path.as_deref(),
                language_id: Some(doc.language_id.as_str()).filter(|id| !id.is_empty()),
            };
            should_lint(event, &info, &doc.settings)
        };

        match decision {
            TriggerDecision::Skip => {
                debug!("Skipping {:?} for {}", event, uri);
                None
            }
            TriggerDecision::Clear => {
                debug!("Clearing diagnostics for {}", uri);
                self.state.clear_results(&uri);
                self.client.publish_diagnostics(uri, vec![], None).await;
                None
            }
            TriggerDecision::Lint { delay } => {
                let backend = self.clone();
                let target = uri.clone();
                Some(self.state.scheduler.trigger(uri, delay, move || async move {
                    backend.validate_document(&target).await;
                }))
            }
        }
    }

    /// Lints the current text of a document and publishes the result.
    async fn validate_document(&self, uri: &Url) {
        debug!("Validating document: {}", uri);

        let Some(doc) = self.state.document(uri) else {
            debug!("Document closed before lint: {}", uri);
            return;
        };
        let settings = doc.settings.clone();
        let executable = settings.executable.path.clone();

        let version = match self.state.tool_health.probe(&executable).await {
            Ok(ToolStatus::Ready(version)) => version,
            Ok(ToolStatus::Unavailable(reason)) => {
                self.report_unavailable(&executable, reason).await;
                return;
            }
            Err(e) => {
                error!("Failed to determine ShellCheck version: {}", e);
                return;
            }
        };
        self.check_version(&executable, &version, &settings);

        let format = OutputFormat::select(&version, settings.enable_quick_fix);
        let request = LintRequest {
            text: doc.text,
            document_path: uri.to_file_path().ok(),
            workspace_root: self.state.workspace_root(),
        };

        match lint_text(&settings, format, &request).await {
            Ok(entries) => {
                let diagnostics: Vec<Diagnostic> = entries
                    .iter()
                    .map(|entry| to_lsp_diagnostic(&entry.diagnostic))
                    .collect();

                if self.state.store_results(uri, doc.generation, entries) {
                    self.client
                        .publish_diagnostics(uri.clone(), diagnostics, Some(doc.version))
                        .await;
                } else {
                    debug!("Discarding stale result for {}", uri);
                }
            }
            Err(LinterError::ToolNotFound { path }) => {
                self.state
                    .tool_health
                    .mark_unavailable(&path, UnavailableReason::NotFound);
                self.report_unavailable(&path, UnavailableReason::NotFound)
                    .await;
            }
            Err(e @ LinterError::Parse(_)) => {
                error!("Failed to parse ShellCheck output for {}: {}", uri, e);
            }
            Err(e) => {
                error!("Lint error for {}: {}", uri, e);
                self.client.show_message(MessageType::ERROR, e).await;
            }
        }
    }

    async fn report_unavailable(&self, path: &Path, reason: UnavailableReason) {
        match reason {
            UnavailableReason::NotFound => {
                if self.state.mark_missing_notified(path) {
                    self.notify_tool_missing(path);
                } else {
                    debug!("Already reported missing executable {}", path.display());
                }
            }
            UnavailableReason::ExecutionFailed => {
                self.client
                    .show_message(
                        MessageType::ERROR,
                        format!("ShellCheck at {} failed to run", path.display()),
                    )
                    .await;
            }
        }
    }

    /// Asks the user what to do about a missing executable.
    ///
    /// Runs detached so the lint run does not wait for the user.
    fn notify_tool_missing(&self, path: &Path) {
        let client = self.client.clone();
        let settings_file = self
            .state
            .workspace_root()
            .map(|root| root.join(Settings::CONFIG_FILES[0]));
        let message = format!(
            "ShellCheck executable not found: {}. Install ShellCheck or set \"executablePath\".",
            path.display()
        );

        tokio::spawn(async move {
            let actions = vec![action_item(OPEN_SETTINGS), action_item(INSTALLATION_GUIDE)];
            let choice = match client
                .show_message_request(MessageType::ERROR, message, Some(actions))
                .await
            {
                Ok(choice) => choice,
                Err(e) => {
                    warn!("Missing executable prompt failed: {}", e);
                    return;
                }
            };

            let target = match choice.as_ref().map(|item| item.title.as_str()) {
                Some(INSTALLATION_GUIDE) => Url::parse(INSTALLATION_URL).ok(),
                Some(OPEN_SETTINGS) => settings_file.and_then(|p| Url::from_file_path(p).ok()),
                _ => None,
            };
            if let Some(uri) = target {
                let external = uri.scheme() != "file";
                show_document(&client, uri, external).await;
            }
        });
    }

    /// Suggests an upgrade once per executable when the version is old.
    fn check_version(&self, path: &Path, version: &semver::Version, settings: &LintSettings) {
        if settings.disable_version_check || !needs_upgrade(version) {
            return;
        }
        if !self.state.mark_version_checked(path) {
            return;
        }
        let store = self.state.options.state_store.clone();
        if store
            .as_ref()
            .is_some_and(|s| s.load().version_check_dismissed)
        {
            return;
        }

        warn!(
            "ShellCheck {} is older than the recommended {}",
            version, RECOMMENDED_VERSION
        );
        let client = self.client.clone();
        let message = format!(
            "ShellCheck {} is older than the recommended {}. Quick fixes need a newer release.",
            version, RECOMMENDED_VERSION
        );

        tokio::spawn(async move {
            let choice = client
                .show_message_request(
                    MessageType::WARNING,
                    message,
                    Some(vec![action_item(DONT_SHOW_AGAIN)]),
                )
                .await;
            if let Ok(Some(item)) = choice
                && item.title == DONT_SHOW_AGAIN
                && let Some(store) = store
                && let Err(e) = store.set_version_check_dismissed(true)
            {
                error!("Failed to persist version check dismissal: {}", e);
            }
        });
    }

    async fn execute(&self, command: ServerCommand) -> Result<Option<Value>> {
        match command {
            ServerCommand::RunLint { uri } => {
                let targets = match uri {
                    Some(uri) => vec![uri],
                    None => self.state.open_documents(),
                };
                let mut completions = Vec::new();
                for uri in targets {
                    if let Some(completion) = self.schedule_lint(uri, LintEvent::Manual).await {
                        completions.push(completion);
                    }
                }
                for completion in completions {
                    completion.await;
                }
                Ok(None)
            }
            ServerCommand::DisableCheckForLine { uri, line, rule_id } => {
                let doc = self
                    .state
                    .document(&uri)
                    .ok_or_else(|| Error::invalid_params("document is not open"))?;
                let edit = disable_for_line(&doc.text, line, &rule_id)
                    .ok_or_else(|| Error::invalid_params("line is out of range"))?;

                let workspace_edit = WorkspaceEdit {
                    changes: Some(HashMap::from([(uri, vec![to_lsp_edit(&edit)])])),
                    ..Default::default()
                };
                match self.client.apply_edit(workspace_edit).await {
                    Ok(response) if !response.applied => {
                        warn!("Client rejected suppression edit: {:?}", response.failure_reason);
                    }
                    Err(e) => error!("Failed to apply suppression edit: {}", e),
                    Ok(_) => {}
                }
                Ok(None)
            }
            ServerCommand::OpenRuleDoc { rule_id } => {
                let code: u32 = rule_id[2..]
                    .parse()
                    .map_err(|_| Error::invalid_params(format!("invalid rule: {}", rule_id)))?;
                let url = Url::parse(&shlint_core::links::wiki_url(code))
                    .map_err(|e| Error::invalid_params(e.to_string()))?;
                show_document(&self.client, url, true).await;
                Ok(None)
            }
            ServerCommand::ResetVersionCheck => {
                self.state.version_checked.lock().clear();
                if let Some(store) = &self.state.options.state_store
                    && let Err(e) = store.set_version_check_dismissed(false)
                {
                    error!("Failed to reset version check: {}", e);
                    return Err(Error::internal_error());
                }
                info!("Version check reset");
                Ok(None)
            }
        }
    }

    /// Re-evaluates every open document after a configuration change.
    async fn relint_all(&self) {
        for uri in self.state.open_documents() {
            let _ = self.schedule_lint(uri, LintEvent::Open).await;
        }
    }
}

fn action_item(title: &str) -> MessageActionItem {
    MessageActionItem {
        title: title.to_string(),
        properties: HashMap::new(),
    }
}

async fn show_document(client: &Client, uri: Url, external: bool) {
    let params = ShowDocumentParams {
        uri,
        external: Some(external),
        take_focus: Some(true),
        selection: None,
    };
    if let Err(e) = client.show_document(params).await {
        warn!("Failed to show document: {}", e);
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handler::handle_initialize(&self.state, params).await
    }

    async fn initialized(&self, _: InitializedParams) {
        handler::handle_initialized(&self.client).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handler::handle_shutdown(&self.state).await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = handler::handle_did_open(&self.state, params);
        let _ = self.schedule_lint(uri, LintEvent::Open).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some(uri) = handler::handle_did_change(&self.state, params) {
            let _ = self.schedule_lint(uri, LintEvent::Change).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let Some(uri) = handler::handle_did_save(&self.state, params) {
            let _ = self.schedule_lint(uri, LintEvent::Save).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = handler::handle_did_close(&self.state, params);
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match handler::handle_did_change_configuration(&self.state, params) {
            Ok(true) => self.relint_all().await,
            Ok(false) => debug!("Configuration unchanged"),
            Err(e) => {
                self.client
                    .show_message(
                        MessageType::ERROR,
                        format!("Invalid shellcheck configuration: {}", e),
                    )
                    .await;
            }
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        handler::handle_code_action(&self.state, params)
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        Ok(handler::handle_document_link(&self.state, params))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        debug!("Execute command: {}", params.command);
        let command = handler::parse_command(params)?;
        self.execute(command).await
    }
}

/// Starts the LSP server.
///
/// This function does not return unless an error occurs or the server shuts down.
pub async fn run() {
    info!("shlint LSP server starting...");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
