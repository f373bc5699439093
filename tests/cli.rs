//! CLI smoke tests.
//!
//! Each test runs the real binary with its config locations pointed into a
//! temporary directory so the host's own configuration never leaks in.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUNDLE: &str = r#"{
    "fields": { "user:id": { "key": true }, "user:name": { "label": "Name" } },
    "services": {
        "read": { "service": ["users"], "action": "read", "key": "user:id" }
    },
    "forms": {
        "login": {
            "type": "input",
            "title": "Sign in",
            "layout": ["user", "go"],
            "widgets": {
                "user": { "type": "field", "field": "user:name" },
                "go":   { "type": "button", "label": "Go" }
            }
        }
    }
}"#;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(dir.path().join("app.json"), BUNDLE).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn bundle(&self) -> PathBuf {
        self.path().join("app.json")
    }

    fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("formweave").unwrap();
        cmd.env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("xdg"))
            .env("FORMWEAVE_CONFIG", self.path().join("config.toml"))
            .env_remove("FORMWEAVE_LOG");
        cmd
    }
}

#[test]
fn inspect_prints_arranged_tree() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("inspect")
        .arg(sandbox.bundle())
        .args(["--form", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("form login \"Sign in\""))
        .stdout(predicate::str::contains("grid (2 columns)"))
        .stdout(predicate::str::contains("[0,0] label \"Name\""))
        .stdout(predicate::str::contains("[1,0 span 2] control go (button)"));
}

#[test]
fn inspect_json_output() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .arg("inspect")
        .arg(sandbox.bundle())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["form"], json!("login"));
    assert_eq!(value[0]["layout"]["container"]["layout"], json!("grid"));
}

#[test]
fn inspect_unknown_form_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("inspect")
        .arg(sandbox.bundle())
        .args(["--form", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown form: nope"));
}

#[test]
fn config_reports_values_and_source() {
    let sandbox = Sandbox::new();
    let path = sandbox.write_config(
        r#"
            [transport]
            base_url = "http://localhost:9999/rpc"
            timeout_secs = 7
        "#,
    );
    sandbox
        .cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(path.display().to_string()))
        .stdout(predicate::str::contains("transport.timeout_secs = 7"));
}

#[test]
fn invalid_config_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.write_config("[transport]\ntimeout_secs = 0\n");
    sandbox
        .cmd()
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs"));
}

#[test]
fn call_without_base_url_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("call")
        .arg(sandbox.bundle())
        .arg("read")
        .args(["--set", "user:id=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No base URL"));
}

#[tokio::test(flavor = "multi_thread")]
async fn call_prints_returned_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/read/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": {"major": 1, "minor": 0, "build": 0},
            "error": {"code": 0, "message": ""},
            "return": {"user:name": "ada"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/read/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": {"major": 1, "minor": 0, "build": 0},
            "error": {"code": 5, "message": "no such user"}
        })))
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        sandbox
            .cmd()
            .arg("call")
            .arg(sandbox.bundle())
            .arg("read")
            .args(["--set", "user:id=7", "--base-url", uri.as_str()])
            .assert()
            .success()
            .stdout(predicate::str::contains("user:id = 7"))
            .stdout(predicate::str::contains("user:name = ada"));

        sandbox
            .cmd()
            .arg("call")
            .arg(sandbox.bundle())
            .arg("read")
            .args(["--set", "user:id=8", "--base-url", uri.as_str()])
            .assert()
            .failure()
            .stderr(predicate::str::contains("read failed [5]: no such user"));
    })
    .await
    .unwrap();
}
