//! Latest lint results per document.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::diagnostic::{LintEntry, TextEdit, TextRange};
use crate::fix::fix_all;

/// Identifies a document, usually by its URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for DocumentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Holds the most recent successful lint result of each document.
///
/// Each `set` replaces the previous result wholesale. Readers get a shared
/// snapshot and never see a partially written list.
#[derive(Debug, Default)]
pub struct DiagnosticStore {
    entries: RwLock<HashMap<DocumentKey, Arc<[LintEntry]>>>,
}

impl DiagnosticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entries of `key`. `None` or an empty list clears them.
    pub fn set(&self, key: DocumentKey, entries: Option<Vec<LintEntry>>) {
        match entries {
            Some(entries) if !entries.is_empty() => {
                self.entries.write().insert(key, entries.into());
            }
            _ => {
                self.entries.write().remove(&key);
            }
        }
    }

    pub fn get(&self, key: &DocumentKey) -> Option<Arc<[LintEntry]>> {
        self.entries.read().get(key).cloned()
    }

    /// Entries whose diagnostic applies to `range`.
    pub fn entries_in(&self, key: &DocumentKey, range: &TextRange) -> Vec<LintEntry> {
        self.get(key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.matches(range))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Non-overlapping edits applying every preferred fix of `key`.
    pub fn fix_all(&self, key: &DocumentKey) -> Vec<TextEdit> {
        self.get(key)
            .map(|entries| fix_all(&entries))
            .unwrap_or_default()
    }

    /// Drops the entries of `key`, returning whether there were any.
    pub fn remove(&self, key: &DocumentKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drops the entries of every document.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
