//! Lint settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::LinterError;

const DEFAULT_EXECUTABLE: &str = "shellcheck";

const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "**/*.xonshrc",
    "**/*.xsh",
    "**/*.zsh",
    "**/*.zshrc",
    "**/zshrc",
    "**/*.zprofile",
    "**/zprofile",
    "**/*.zlogin",
    "**/zlogin",
    "**/*.zlogout",
    "**/zlogout",
    "**/*.zshenv",
    "**/zshenv",
    "**/*.zsh-theme",
];

const DEFAULT_IGNORE_SCHEMES: &[&str] = &["git", "gitfs", "output"];

/// When lint runs are triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunTrigger {
    /// Lint on open, every edit and save.
    #[default]
    OnType,
    /// Lint on open and save.
    OnSave,
    /// Lint only when explicitly requested.
    Manual,
}

/// Raw configuration as delivered by the editor or a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enable: bool,
    pub executable_path: String,
    pub run: RunTrigger,
    pub exclude: Vec<String>,
    pub custom_args: Vec<String>,
    /// Glob patterns mapped to whether they are active.
    pub ignore_patterns: BTreeMap<String, bool>,
    pub ignore_file_schemes: Vec<String>,
    pub use_workspace_root_as_cwd: bool,
    pub enable_quick_fix: bool,
    pub disable_version_check: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable: true,
            executable_path: DEFAULT_EXECUTABLE.to_string(),
            run: RunTrigger::OnType,
            exclude: Vec::new(),
            custom_args: Vec::new(),
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| (p.to_string(), true))
                .collect(),
            ignore_file_schemes: DEFAULT_IGNORE_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            use_workspace_root_as_cwd: false,
            enable_quick_fix: false,
            disable_version_check: false,
        }
    }
}

impl Settings {
    /// Names of config files discovered in a directory.
    pub const CONFIG_FILES: &'static [&'static str] = &[".shlint.json"];

    /// Parses settings from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, LinterError> {
        serde_json::from_str(json)
            .map_err(|e| LinterError::config(format!("Invalid settings: {}", e)))
    }

    /// Parses settings from an already decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, LinterError> {
        serde_json::from_value(value)
            .map_err(|e| LinterError::config(format!("Invalid settings: {}", e)))
    }

    /// Loads settings from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LinterError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| LinterError::config(format!("Failed to read config: {}", e)))?;
        Self::from_json(&content)
    }

    /// Looks for a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        Self::CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// The executable used for linting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    pub path: PathBuf,
    /// Whether the path points at a binary shipped alongside the server
    /// rather than one configured by the user.
    pub bundled: bool,
}

/// Resolved, immutable settings for one document at one point in time.
///
/// A new snapshot replaces the old one whenever configuration changes.
#[derive(Debug, Clone)]
pub struct LintSettings {
    pub enable: bool,
    pub run: RunTrigger,
    pub executable: Executable,
    pub exclude: Vec<String>,
    pub custom_args: Vec<String>,
    pub ignore_file_schemes: Vec<String>,
    pub use_workspace_root_as_cwd: bool,
    pub enable_quick_fix: bool,
    pub disable_version_check: bool,
    ignore_matcher: GlobSet,
}

impl LintSettings {
    /// Resolves raw settings into a snapshot, compiling the ignore patterns.
    pub fn resolve(settings: &Settings) -> Result<Self, LinterError> {
        Self::resolve_with_bundled(settings, None)
    }

    /// Like [`LintSettings::resolve`], with a bundled executable used when
    /// the configured path is left at its default.
    pub fn resolve_with_bundled(
        settings: &Settings,
        bundled: Option<&Path>,
    ) -> Result<Self, LinterError> {
        let mut builder = GlobSetBuilder::new();
        for (pattern, active) in &settings.ignore_patterns {
            if !active {
                continue;
            }
            let glob = Glob::new(pattern).map_err(|e| {
                LinterError::config(format!("Invalid ignore pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let ignore_matcher = builder
            .build()
            .map_err(|e| LinterError::config(format!("Invalid ignore patterns: {}", e)))?;

        let executable = match bundled {
            Some(path) if settings.executable_path == DEFAULT_EXECUTABLE => Executable {
                path: path.to_path_buf(),
                bundled: true,
            },
            _ => Executable {
                path: PathBuf::from(&settings.executable_path),
                bundled: false,
            },
        };

        Ok(Self {
            enable: settings.enable,
            run: settings.run,
            executable,
            exclude: settings.exclude.clone(),
            custom_args: settings.custom_args.clone(),
            ignore_file_schemes: settings.ignore_file_schemes.clone(),
            use_workspace_root_as_cwd: settings.use_workspace_root_as_cwd,
            enable_quick_fix: settings.enable_quick_fix,
            disable_version_check: settings.disable_version_check,
            ignore_matcher,
        })
    }

    /// Returns true when `path` matches an active ignore pattern.
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        self.ignore_matcher.is_match(path)
    }

    /// Returns true when documents with `scheme` are never linted.
    pub fn is_ignored_scheme(&self, scheme: &str) -> bool {
        self.ignore_file_schemes.iter().any(|s| s == scheme)
    }
}

impl Default for LintSettings {
    fn default() -> Self {
        Self::resolve(&Settings::default()).unwrap_or_else(|_| Self {
            enable: true,
            run: RunTrigger::OnType,
            executable: Executable {
                path: PathBuf::from(DEFAULT_EXECUTABLE),
                bundled: false,
            },
            exclude: Vec::new(),
            custom_args: Vec::new(),
            ignore_file_schemes: Vec::new(),
            use_workspace_root_as_cwd: false,
            enable_quick_fix: false,
            disable_version_check: false,
            ignore_matcher: GlobSet::empty(),
        })
    }
}
