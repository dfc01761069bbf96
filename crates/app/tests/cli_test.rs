//! Integration tests for the `authgate` command line.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::{TempDir, tempdir};

struct Fixture {
    _dir: TempDir,
    settings: PathBuf,
    token: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempdir().expect("Failed to create temp directory");
    let token = dir.path().join("token.json");
    let settings = dir.path().join("authgate.toml");
    std::fs::write(
        &settings,
        format!(
            r#"
[store]
kind = "file"
path = "{}"

[providers.dummy]
service = "dummy"
[providers.dummy.config]
token = "cli-token"

[providers.broken]
service = "dummy"
[providers.broken.config]
always_fail = true
failure_messages = ["Invalid credentials"]
"#,
            token.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    Fixture {
        _dir: dir,
        settings,
        token,
    }
}

fn authgate(settings: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_authgate"))
        .arg("--config")
        .arg(settings)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run authgate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_providers_are_listed_sorted() {
    let fx = fixture();
    let output = authgate(&fx.settings, &["providers"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "broken\ndummy\n");
}

#[test]
fn test_login_status_logout_cycle() {
    let fx = fixture();

    let login = authgate(
        &fx.settings,
        &["login", "dummy", "--email", "ada@example.com", "--password", "x"],
    );
    assert!(login.status.success());
    assert!(stdout(&login).contains("success: true"));
    assert!(stdout(&login).contains("token: stored"));
    assert!(fx.token.exists());

    let status = authgate(&fx.settings, &["status"]);
    assert!(stdout(&status).contains("authenticated: true"));

    let logout = authgate(&fx.settings, &["logout", "dummy"]);
    assert!(logout.status.success());
    assert!(!fx.token.exists());

    let status = authgate(&fx.settings, &["status"]);
    assert!(stdout(&status).contains("authenticated: false"));
}

#[test]
fn test_failed_login_exits_nonzero() {
    let fx = fixture();

    let output = authgate(
        &fx.settings,
        &["login", "broken", "--email", "ada@example.com", "--password", "x"],
    );

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("success: false"));
    assert!(out.contains("message: Invalid credentials"));
    assert!(out.contains("error: Something went wrong."));
    assert!(!fx.token.exists());
}

#[test]
fn test_unknown_provider_is_an_error() {
    let fx = fixture();

    let output = authgate(&fx.settings, &["logout", "github"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not registered"));
}
