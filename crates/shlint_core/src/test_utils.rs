use std::fs;
use std::path::{Path, PathBuf};

/// Writes an executable `/bin/sh` script named `shellcheck` into `dir`.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("shellcheck");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write fake tool");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to mark fake tool executable");
    path
}
