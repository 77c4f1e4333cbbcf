//! Integration tests for CLI behavior
//!
//! These tests verify the external behavior of the shlint binary against
//! fake `shellcheck` scripts.

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper to create a command for the shlint CLI
fn shlint_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_shlint"))
}

mod help_command {
    use super::*;

    #[test]
    fn shows_help_with_flag() {
        shlint_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"));
    }

    #[test]
    fn shows_version_with_flag() {
        shlint_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn dry_run_requires_fix() {
        shlint_cmd()
            .args(["check", "--dry-run", "a.sh"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--fix"));
    }
}

#[cfg(unix)]
mod check_command {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const SC2086_INFO: &str = r#"[{"file":"-","line":2,"endLine":2,"column":6,"endColumn":10,
      "level":"info","code":2086,"message":"Double quote to prevent globbing and word splitting."}]"#;

    const SC1009_ERROR: &str = r#"[{"file":"-","line":2,"endLine":2,"column":1,"endColumn":1,
      "level":"error","code":1009,"message":"The mentioned syntax error was in this if expression."}]"#;

    /// Writes a fake shellcheck that prints `findings` unless the input
    /// already quotes `$foo`.
    fn fake_tool(dir: &Path, findings: &str, clean: &str) -> PathBuf {
        fs::write(dir.join("findings.json"), findings).unwrap();
        fs::write(dir.join("clean.json"), clean).unwrap();
        let path = dir.join("shellcheck");
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then\n\
             echo 'version: 0.9.0'\n\
             exit 0\n\
             fi\n\
             input=$(cat)\n\
             case \"$input\" in\n\
             *'\"$foo\"'*) cat '{dir}/clean.json' ;;\n\
             *) cat '{dir}/findings.json' ;;\n\
             esac\n\
             exit 1\n",
            dir = dir.display()
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn script(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("script.sh");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn reports_findings_as_text() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), SC2086_INFO, "[]");
        let file = script(dir.path(), "#!/bin/sh\necho $foo\n");

        shlint_cmd()
            .current_dir(dir.path())
            .arg("--executable")
            .arg(&tool)
            .arg("check")
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("2:6 info [SC2086]"))
            .stdout(predicate::str::contains("Checked 1 files, found 1 issues"));
    }

    #[test]
    fn exits_with_one_on_error_findings() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), SC1009_ERROR, "[]");
        let file = script(dir.path(), "#!/bin/sh\nif\n");

        shlint_cmd()
            .current_dir(dir.path())
            .arg("--executable")
            .arg(&tool)
            .args(["check", "--format", "json"])
            .arg(&file)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("\"code\": 1009"))
            .stdout(predicate::str::contains("\"severity\": \"error\""));
    }

    #[test]
    fn exits_with_two_when_tool_is_missing() {
        let dir = TempDir::new().unwrap();
        let file = script(dir.path(), "echo hi\n");

        shlint_cmd()
            .current_dir(dir.path())
            .arg("--executable")
            .arg(dir.path().join("missing-shellcheck"))
            .arg("check")
            .arg(&file)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn reads_executable_from_config_file() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), SC2086_INFO, "[]");
        let file = script(dir.path(), "#!/bin/sh\necho $foo\n");
        let config = serde_json::json!({ "executablePath": tool });
        fs::write(dir.path().join(".shlint.json"), config.to_string()).unwrap();

        shlint_cmd()
            .current_dir(dir.path())
            .arg("check")
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("[SC2086]"));
    }

    #[test]
    fn skips_ignored_files() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), SC1009_ERROR, "[]");
        let file = dir.path().join("prompt.zsh");
        fs::write(&file, "echo $foo\n").unwrap();

        shlint_cmd()
            .current_dir(dir.path())
            .arg("--executable")
            .arg(&tool)
            .arg("check")
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Checked 0 files"));
    }

    const SC2086_FIXABLE: &str = r#"{"comments":[{"file":"-","line":2,"endLine":2,"column":6,
      "endColumn":10,"level":"info","code":2086,"message":"Double quote to prevent globbing and word splitting.",
      "fix":{"replacements":[
        {"line":2,"endLine":2,"column":6,"endColumn":6,"precedence":7,"replacement":"\""},
        {"line":2,"endLine":2,"column":10,"endColumn":10,"precedence":7,"replacement":"\""}]}}]}"#;

    #[test]
    fn fix_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), SC2086_FIXABLE, r#"{"comments":[]}"#);
        let file = script(dir.path(), "#!/bin/sh\necho $foo\n");

        shlint_cmd()
            .current_dir(dir.path())
            .arg("--executable")
            .arg(&tool)
            .args(["check", "--fix"])
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Fixed 1 issues in 1 files"))
            .stdout(predicate::str::contains("found 0 issues"));

        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "#!/bin/sh\necho \"$foo\"\n"
        );
    }

    #[test]
    fn dry_run_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(dir.path(), SC2086_FIXABLE, r#"{"comments":[]}"#);
        let file = script(dir.path(), "#!/bin/sh\necho $foo\n");

        shlint_cmd()
            .current_dir(dir.path())
            .arg("--executable")
            .arg(&tool)
            .args(["check", "--fix", "--dry-run"])
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Would fix 1 issues in 1 files"));

        assert_eq!(fs::read_to_string(&file).unwrap(), "#!/bin/sh\necho $foo\n");
    }
}
