//! LSP Backend state management.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tower_lsp::lsp_types::Url;

use shlint_core::{
    Debouncer, DiagnosticStore, DocumentKey, LintEntry, LintSettings, LinterError, Settings,
    StateStore, ToolHealth,
};

/// Per-document cache. Dropped as a whole on close.
#[derive(Debug, Clone)]
pub(crate) struct DocumentData {
    pub text: String,
    pub version: i32,
    pub language_id: String,
    pub settings: Arc<LintSettings>,
    /// Results of runs started under another generation are stale.
    pub generation: u64,
}

/// Options fixed for the lifetime of a server.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Where to persist the upgrade-advisory dismissal. `None` keeps it in
    /// memory only.
    pub state_store: Option<StateStore>,
    /// A ShellCheck binary shipped next to the server.
    pub bundled_executable: Option<PathBuf>,
}

impl BackendOptions {
    /// Options for a server running on the user's machine.
    pub fn from_environment() -> Self {
        let bundled_executable = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("shellcheck")))
            .filter(|path| path.is_file());

        Self {
            state_store: StateStore::default_location(),
            bundled_executable,
        }
    }
}

/// Shared backend state.
pub(crate) struct BackendState {
    /// Open documents.
    pub documents: RwLock<HashMap<Url, DocumentData>>,
    /// Raw configuration as last delivered by the client.
    pub settings: RwLock<Settings>,
    /// Resolved snapshot handed to newly opened documents.
    pub resolved: RwLock<Arc<LintSettings>>,
    /// Workspace root path.
    pub workspace_root: RwLock<Option<PathBuf>>,
    pub tool_health: ToolHealth,
    pub diagnostics: DiagnosticStore,
    pub scheduler: Debouncer<Url, ()>,
    /// Executables already reported missing since the last config change.
    pub notified_missing: Mutex<HashSet<PathBuf>>,
    /// Executables already checked against the recommended version.
    pub version_checked: Mutex<HashSet<PathBuf>>,
    pub options: BackendOptions,
    generations: AtomicU64,
}

impl fmt::Debug for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendState")
            .field("documents", &"<HashMap<Url, DocumentData>>")
            .field("settings", &self.settings)
            .field("workspace_root", &self.workspace_root)
            .field("options", &self.options)
            .finish()
    }
}

impl BackendState {
    pub fn new(options: BackendOptions) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            settings: RwLock::new(Settings::default()),
            resolved: RwLock::new(Arc::new(LintSettings::default())),
            workspace_root: RwLock::new(None),
            tool_health: ToolHealth::new(),
            diagnostics: DiagnosticStore::new(),
            scheduler: Debouncer::new(),
            notified_missing: Mutex::new(HashSet::new()),
            version_checked: Mutex::new(HashSet::new()),
            options,
            generations: AtomicU64::new(0),
        }
    }

    /// A generation no document has used yet.
    pub fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Installs new raw settings and starts a new configuration epoch.
    ///
    /// Every open document gets the new snapshot, cached tool statuses are
    /// dropped, and missing-tool notifications may be shown again.
    pub fn apply_settings(&self, settings: Settings) -> Result<(), LinterError> {
        let resolved = Arc::new(LintSettings::resolve_with_bundled(
            &settings,
            self.options.bundled_executable.as_deref(),
        )?);

        *self.settings.write() = settings;
        *self.resolved.write() = resolved.clone();
        for doc in self.documents.write().values_mut() {
            doc.settings = resolved.clone();
        }

        self.tool_health.invalidate();
        self.notified_missing.lock().clear();
        Ok(())
    }

    pub fn current_settings(&self) -> Arc<LintSettings> {
        self.resolved.read().clone()
    }

    pub fn document(&self, uri: &Url) -> Option<DocumentData> {
        self.documents.read().get(uri).cloned()
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.documents.read().contains_key(uri)
    }

    pub fn open_documents(&self) -> Vec<Url> {
        self.documents.read().keys().cloned().collect()
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.read().clone()
    }

    /// Drops the diagnostics of an open document and makes results of runs
    /// already in flight stale.
    pub fn clear_results(&self, uri: &Url) {
        let mut docs = self.documents.write();
        if let Some(doc) = docs.get_mut(uri) {
            doc.generation = self.next_generation();
        }
        self.scheduler.cancel(uri);
        self.diagnostics.remove(&document_key(uri));
    }

    /// Stores `entries` unless `uri` was closed or cleared since the run for
    /// `generation` started. Returns whether they were stored.
    pub fn store_results(&self, uri: &Url, generation: u64, entries: Vec<LintEntry>) -> bool {
        // The read lock keeps a concurrent close or clear from interleaving.
        let docs = self.documents.read();
        let current = docs.get(uri).is_some_and(|doc| doc.generation == generation);
        if current {
            self.diagnostics.set(document_key(uri), Some(entries));
        }
        current
    }

    /// Forgets everything known about `uri`.
    pub fn close(&self, uri: &Url) {
        self.documents.write().remove(uri);
        self.scheduler.cancel(uri);
        self.diagnostics.remove(&document_key(uri));
    }

    /// Records that `path` was reported missing. Returns false if it
    /// already was in this epoch.
    pub fn mark_missing_notified(&self, path: &std::path::Path) -> bool {
        self.notified_missing.lock().insert(path.to_path_buf())
    }

    /// Returns true the first time a given executable is version checked.
    pub fn mark_version_checked(&self, path: &std::path::Path) -> bool {
        self.version_checked.lock().insert(path.to_path_buf())
    }
}

pub(crate) fn document_key(uri: &Url) -> DocumentKey {
    DocumentKey::from(uri.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(settings: Arc<LintSettings>) -> DocumentData {
        DocumentData {
            text: "echo $1\n".to_string(),
            version: 1,
            language_id: "shellscript".to_string(),
            settings,
            generation: 1,
        }
    }

    #[test]
    fn test_apply_settings_updates_open_documents() {
        let state = BackendState::new(BackendOptions::default());
        let uri = Url::parse("file:///tmp/a.sh").unwrap();
        state
            .documents
            .write()
            .insert(uri.clone(), doc(state.current_settings()));

        let settings = Settings {
            executable_path: "/opt/sc".to_string(),
            ..Settings::default()
        };
        state.apply_settings(settings).unwrap();

        let stored = state.document(&uri).unwrap();
        assert_eq!(
            stored.settings.executable.path,
            std::path::Path::new("/opt/sc")
        );
    }

    #[test]
    fn test_invalid_settings_keep_previous_snapshot() {
        let state = BackendState::new(BackendOptions::default());
        let mut settings = Settings::default();
        settings.ignore_patterns.insert("[".to_string(), true);

        assert!(state.apply_settings(settings).is_err());
        assert_eq!(
            state.current_settings().executable.path,
            std::path::Path::new("shellcheck")
        );
    }

    #[test]
    fn test_missing_notification_resets_with_epoch() {
        let state = BackendState::new(BackendOptions::default());
        let path = std::path::Path::new("/nope/shellcheck");

        assert!(state.mark_missing_notified(path));
        assert!(!state.mark_missing_notified(path));

        state.apply_settings(Settings::default()).unwrap();
        assert!(state.mark_missing_notified(path));
    }

    #[tokio::test]
    async fn test_close_drops_document_caches() {
        let state = BackendState::new(BackendOptions::default());
        let uri = Url::parse("file:///tmp/a.sh").unwrap();
        state
            .documents
            .write()
            .insert(uri.clone(), doc(state.current_settings()));
        state.diagnostics.set(document_key(&uri), Some(Vec::new()));

        state.close(&uri);
        assert!(!state.is_open(&uri));
        assert!(state.diagnostics.get(&document_key(&uri)).is_none());
        assert!(state.scheduler.is_idle(&uri));
    }

    fn entry() -> LintEntry {
        use shlint_core::{Diagnostic, Position, TextRange};
        let range = TextRange::new(Position::new(0, 5), Position::new(0, 7));
        LintEntry {
            diagnostic: Diagnostic::new(2086, "Double quote", range),
            actions: Vec::new(),
        }
    }

    #[test]
    fn test_cleared_document_rejects_stale_results() {
        let state = BackendState::new(BackendOptions::default());
        let uri = Url::parse("file:///tmp/a.sh").unwrap();
        let mut data = doc(state.current_settings());
        data.generation = state.next_generation();
        let started = data.generation;
        state.documents.write().insert(uri.clone(), data);

        assert!(state.store_results(&uri, started, vec![entry()]));
        assert!(state.diagnostics.get(&document_key(&uri)).is_some());

        state.clear_results(&uri);
        assert!(state.diagnostics.get(&document_key(&uri)).is_none());
        assert!(!state.store_results(&uri, started, vec![entry()]));
        assert!(state.diagnostics.get(&document_key(&uri)).is_none());

        let current = state.document(&uri).unwrap().generation;
        assert!(state.store_results(&uri, current, vec![entry()]));
    }

    #[test]
    fn test_reopened_document_rejects_results_of_old_session() {
        let state = BackendState::new(BackendOptions::default());
        let uri = Url::parse("file:///tmp/a.sh").unwrap();
        let mut data = doc(state.current_settings());
        data.generation = state.next_generation();
        let started = data.generation;
        state.documents.write().insert(uri.clone(), data.clone());

        state.close(&uri);
        assert!(!state.store_results(&uri, started, vec![entry()]));

        data.generation = state.next_generation();
        state.documents.write().insert(uri.clone(), data);
        assert!(!state.store_results(&uri, started, vec![entry()]));
        assert!(state.diagnostics.get(&document_key(&uri)).is_none());
    }
}
