//! # shlint_core
//!
//! Lint orchestration engine for shlint.
//!
//! This crate provides:
//! - Settings resolution and the lint trigger policy
//! - ShellCheck health probing and process invocation
//! - Output parsing into diagnostics and code actions
//! - A per-key debounced scheduler
//! - The per-document diagnostic store and fix-all aggregation
//!
//! ## Example
//!
//! ```rust,ignore
//! use shlint_core::{LintSettings, OutputFormat, Settings, ToolHealth, ToolStatus};
//!
//! let settings = LintSettings::resolve(&Settings::default())?;
//! let health = ToolHealth::new();
//! if let ToolStatus::Ready(version) = health.probe(&settings.executable.path).await? {
//!     let format = OutputFormat::select(&version, settings.enable_quick_fix);
//!     let entries = shlint_core::lint_text(&settings, format, &request).await?;
//! }
//! ```

mod config;
mod diagnostic;
mod error;
mod fix;
pub mod invocation;
pub mod links;
mod lint;
pub mod parser;
mod persist;
pub mod scheduler;
mod store;
pub mod suppress;
pub mod tool;
pub mod trigger;

#[cfg(test)]
pub mod test_utils;

pub use config::{Executable, LintSettings, RunTrigger, Settings};
pub use diagnostic::{
    ActionKind, Diagnostic, DiagnosticTag, Fix, LintAction, LintEntry, Position, Severity,
    TextEdit, TextRange,
};
pub use error::LinterError;
pub use fix::{apply_edits, fix_all};
pub use lint::{LintRequest, lint_text};
pub use parser::{OutputFormat, parse_output};
pub use persist::{PersistedState, StateStore};
pub use scheduler::{Completion, Debouncer, Phase};
pub use store::{DiagnosticStore, DocumentKey};
pub use tool::{ToolHealth, ToolStatus, UnavailableReason};
pub use trigger::{DocumentInfo, LintEvent, TriggerDecision, should_lint};
