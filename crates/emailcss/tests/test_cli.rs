//! Exit status of the `emailcss` binary, driven against a scripted `lessc`.
#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use serial_test::serial;
use tempfile::TempDir;

const FAKE_LESSC: &str = r#"#!/bin/sh
case "$(cat "$1")" in
  *FAIL*) echo "ParseError: Unrecognised input in $1" >&2; exit 1 ;;
  *) printf 'body{color:#333}' > "$2" ;;
esac
"#;

struct Project {
    root: PathBuf,
    _temp_dir: TempDir,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        let lessc = root.join("lessc");
        fs::write(&lessc, FAKE_LESSC).unwrap();
        fs::set_permissions(&lessc, fs::Permissions::from_mode(0o755)).unwrap();

        fs::write(root.join("emailcss.toml"), "").unwrap();
        fs::create_dir_all(root.join("stage/css")).unwrap();
        for (name, content) in files {
            fs::write(root.join("stage/css").join(name), content).unwrap();
        }

        Self {
            root,
            _temp_dir: temp_dir,
        }
    }

    fn emailcss(&self, extra: &[&str]) -> Output {
        self.emailcss_with(&self.root.join("lessc"), extra)
    }

    fn emailcss_with(&self, lessc: &Path, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_emailcss"))
            .arg("--root")
            .arg(&self.root)
            .args(["--staging", "stage", "--dest", "out"])
            .arg("--config")
            .arg(self.root.join("emailcss.toml"))
            .arg("--lessc")
            .arg(lessc)
            .args(extra)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

#[test]
#[serial]
fn test_partial_completion_exits_successfully() {
    let project = Project::new(&[("email.less", "FAIL"), ("email-inline.less", "@b: 2;")]);

    let output = project.emailcss(&[]);

    assert!(output.status.success());
    assert!(project.root.join("out/css/email-inline.css").is_file());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("failed email.less"));
    assert!(stdout.contains("compiled email-inline.less -> css/email-inline.css"));
}

#[test]
#[serial]
fn test_strict_partial_completion_fails() {
    let project = Project::new(&[("email.less", "FAIL"), ("email-inline.less", "@b: 2;")]);

    let output = project.emailcss(&["--strict"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(project.root.join("out/css/email-inline.css").is_file());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 email stylesheet(s) failed to compile"));
}

#[test]
#[serial]
fn test_strict_clean_run_succeeds() {
    let project = Project::new(&[("email.less", "@a: 1;")]);

    let output = project.emailcss(&["--strict"]);

    assert!(output.status.success());
}

#[test]
#[serial]
fn test_missing_compiler_fails() {
    let project = Project::new(&[("email.less", "@a: 1;")]);
    let missing = project.root.join("bin/lessc");

    let output = project.emailcss_with(&missing, &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found or not executable"));
    assert!(!project.root.join("out/css/email.css").exists());
}

#[test]
#[serial]
fn test_invalid_config_fails() {
    let project = Project::new(&[("email.less", "@a: 1;")]);
    fs::write(project.root.join("emailcss.toml"), "files = []\n").unwrap();

    let output = project.emailcss(&[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid config file"));
}
