//! Deciding whether an editor event should start a lint run.

use std::path::Path;
use std::time::Duration;

use crate::config::{LintSettings, RunTrigger};

/// Debounce applied to edits.
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Language id of documents this server lints.
pub const SHELL_LANGUAGE_ID: &str = "shellscript";

/// Editor events that may lead to a lint run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintEvent {
    Open,
    Change,
    Save,
    /// An explicit user request.
    Manual,
}

/// What is known about the document an event refers to.
#[derive(Debug, Clone, Copy)]
pub struct DocumentInfo<'a> {
    pub uri_scheme: &'a str,
    pub path: Option<&'a Path>,
    pub language_id: Option<&'a str>,
}

/// Outcome of [`should_lint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Schedule a run after `delay`.
    Lint { delay: Duration },
    /// Leave the document alone.
    Skip,
    /// Drop whatever diagnostics the document has.
    Clear,
}

pub fn should_lint(
    event: LintEvent,
    doc: &DocumentInfo<'_>,
    settings: &LintSettings,
) -> TriggerDecision {
    if doc.language_id.is_some_and(|id| id != SHELL_LANGUAGE_ID) {
        return TriggerDecision::Skip;
    }
    if settings.is_ignored_scheme(doc.uri_scheme) {
        return TriggerDecision::Skip;
    }
    if !settings.enable {
        return TriggerDecision::Clear;
    }
    if doc.path.is_some_and(|path| settings.is_ignored_path(path)) {
        return TriggerDecision::Clear;
    }

    let fires = match (settings.run, event) {
        (_, LintEvent::Manual) => true,
        (RunTrigger::OnType, _) => true,
        (RunTrigger::OnSave, LintEvent::Open | LintEvent::Save) => true,
        _ => false,
    };
    if !fires {
        return TriggerDecision::Skip;
    }

    let delay = match event {
        LintEvent::Change => Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        _ => Duration::ZERO,
    };
    TriggerDecision::Lint { delay }
}
