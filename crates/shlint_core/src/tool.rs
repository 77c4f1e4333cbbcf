//! ShellCheck availability and version probing.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use parking_lot::Mutex;
use semver::Version;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::LinterError;

/// Upper bound for the `--version` call.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Versions older than this get an upgrade suggestion.
pub const RECOMMENDED_VERSION: Version = Version::new(0, 7, 0);

const NOT_FOUND_EXIT_CODES: &[i32] = &[127, 9009];

const NOT_FOUND_PHRASES: &[&str] = &[
    "command not found",
    "no such file or directory",
    "is not recognized as an internal or external command",
    "cannot find the path",
];

/// Why the tool cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    NotFound,
    ExecutionFailed,
}

/// Cached outcome of probing an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Ready(Version),
    Unavailable(UnavailableReason),
}

/// Per-path cache of tool statuses.
#[derive(Debug, Default)]
pub struct ToolHealth {
    statuses: Mutex<HashMap<PathBuf, ToolStatus>>,
}

impl ToolHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status of `path`, probing it on first use.
    ///
    /// A version string that cannot be parsed is reported as an error and
    /// not cached, so the next call probes again.
    pub async fn probe(&self, path: &Path) -> Result<ToolStatus, LinterError> {
        if let Some(status) = self.cached(path) {
            return Ok(status);
        }

        debug!("Probing {}", path.display());
        let status = match query_version(path).await {
            Ok(output) => ToolStatus::Ready(parse_version(&output)?),
            Err(reason) => ToolStatus::Unavailable(reason),
        };

        self.statuses
            .lock()
            .insert(path.to_path_buf(), status.clone());
        Ok(status)
    }

    pub fn cached(&self, path: &Path) -> Option<ToolStatus> {
        self.statuses.lock().get(path).cloned()
    }

    /// Records a failure observed while running the tool.
    pub fn mark_unavailable(&self, path: &Path, reason: UnavailableReason) {
        self.statuses
            .lock()
            .insert(path.to_path_buf(), ToolStatus::Unavailable(reason));
    }

    /// Forgets every cached status.
    pub fn invalidate(&self) {
        self.statuses.lock().clear();
    }
}

async fn query_version(path: &Path) -> Result<String, UnavailableReason> {
    let child = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            debug!("Failed to spawn {}: {}", path.display(), e);
            classify_spawn_error(&e)
        })?;

    let output = match tokio::time::timeout(VERSION_PROBE_TIMEOUT, child.wait_with_output()).await
    {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(classify_spawn_error(&e)),
        Err(_) => {
            warn!("{} --version timed out", path.display());
            return Err(UnavailableReason::ExecutionFailed);
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(classify_failure(
        output.status.code(),
        &format!("{}\n{}", stdout, stderr),
    ))
}

/// Classifies an error returned while spawning or waiting on the process.
pub fn classify_spawn_error(err: &io::Error) -> UnavailableReason {
    if err.kind() == io::ErrorKind::NotFound {
        return UnavailableReason::NotFound;
    }
    classify_failure(err.raw_os_error(), &err.to_string())
}

/// Classifies a failed run from its exit code and combined output.
pub fn classify_failure(exit_code: Option<i32>, output: &str) -> UnavailableReason {
    if exit_code.is_some_and(|code| NOT_FOUND_EXIT_CODES.contains(&code)) {
        return UnavailableReason::NotFound;
    }

    let lowered = output.to_lowercase();
    if NOT_FOUND_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        UnavailableReason::NotFound
    } else {
        UnavailableReason::ExecutionFailed
    }
}

/// Extracts the version from `shellcheck --version` output.
pub fn parse_version(output: &str) -> Result<Version, LinterError> {
    let token = output
        .lines()
        .find_map(|line| {
            let idx = line.find("version:")?;
            line[idx + "version:".len()..].split_whitespace().next()
        })
        .ok_or_else(|| LinterError::Version(format!("no version in output: {:?}", output)))?;

    let token = token.strip_prefix('v').unwrap_or(token);
    let padded = match token.split('.').count() {
        1 => format!("{}.0.0", token),
        2 => format!("{}.0", token),
        _ => token.to_string(),
    };

    Version::parse(&padded)
        .map_err(|e| LinterError::Version(format!("invalid version '{}': {}", token, e)))
}

/// Returns true when `version` is old enough to warrant an upgrade hint.
pub fn needs_upgrade(version: &Version) -> bool {
    *version < RECOMMENDED_VERSION
}
