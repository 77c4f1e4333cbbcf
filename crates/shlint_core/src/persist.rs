//! Small piece of state that survives restarts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::LinterError;

/// State persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    /// The user asked not to be reminded about old ShellCheck versions.
    pub version_check_dismissed: bool,
}

/// JSON file backing [`PersistedState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/shlint/state.json`, if the platform has a data directory.
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join("shlint").join("state.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the state. A missing or unreadable file yields the default state.
    pub fn load(&self) -> PersistedState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {}", self.path.display(), e);
                }
                return PersistedState::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring corrupt state file {}: {}", self.path.display(), e);
            PersistedState::default()
        })
    }

    pub fn save(&self, state: &PersistedState) -> Result<(), LinterError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| LinterError::config(format!("Failed to encode state: {}", e)))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn set_version_check_dismissed(&self, dismissed: bool) -> Result<(), LinterError> {
        let mut state = self.load();
        state.version_check_dismissed = dismissed;
        self.save(&state)
    }
}
