//! Integration tests for the `vaultmount` CLI binary.
//!
//! These tests run the CLI as a subprocess and check exit codes, output,
//! and the state file it leaves behind. Tests that need a Vault server run
//! against a `wiremock` stand-in for the `sys/mounts` endpoints.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn vaultmount_bin() -> String {
    let path = env!("CARGO_BIN_EXE_vaultmount");
    assert!(
        Path::new(path).exists(),
        "vaultmount binary not found at {path}"
    );
    path.to_owned()
}

/// Run vaultmount against `addr` and return (`exit_code`, stdout, stderr).
fn run_at(addr: &str, token: Option<&str>, args: &[&str]) -> (i32, String, String) {
    let mut cmd = Command::new(vaultmount_bin());
    cmd.args(args)
        .env("VAULT_ADDR", addr)
        .env_remove("VAULT_TOKEN")
        .env_remove("VAULT_NAMESPACE")
        .env_remove("RUST_LOG");
    if let Some(t) = token {
        cmd.env("VAULT_TOKEN", t);
    }
    let output = cmd.output().expect("failed to execute vaultmount");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

/// Run against a non-existent server.
fn run(args: &[&str]) -> (i32, String, String) {
    run_at("http://127.0.0.1:19999", Some("root-token"), args)
}

fn write_config(dir: &Path, body: &Value) -> PathBuf {
    let path = dir.join("resource.json");
    fs::write(&path, serde_json::to_vec(body).unwrap()).unwrap();
    path
}

fn ssh_config() -> Value {
    json!({
        "type": "ssh",
        "path": "ssh-test",
        "description": "test description",
        "default_lease_ttl_seconds": 3600,
        "max_lease_ttl_seconds": 86400
    })
}

fn mounts_body(default_ttl: i64, max_ttl: i64) -> Value {
    mounts_body_described("test description", default_ttl, max_ttl)
}

fn mounts_body_described(description: &str, default_ttl: i64, max_ttl: i64) -> Value {
    json!({
        "request_id": "0f7b",
        "data": {
            "sys/": { "type": "system", "description": "system endpoints", "config": { "default_lease_ttl": 0, "max_lease_ttl": 0 } },
            "ssh-test/": {
                "type": "ssh",
                "description": description,
                "accessor": "ssh_6a1e",
                "config": { "default_lease_ttl": default_ttl, "max_lease_ttl": max_ttl, "force_no_cache": false },
                "local": false,
                "seal_wrap": false
            }
        }
    })
}

/// Write a state file that already manages `ssh-test`.
fn seed_state(state: &Path, description: &str, default_ttl: i64, max_ttl: i64) {
    fs::write(
        state,
        serde_json::to_vec(&json!({
            "version": 1,
            "resource_type": "vault_secret_backend",
            "resource": {
                "id": "ssh-test",
                "path": "ssh-test",
                "type": "ssh",
                "description": description,
                "default_lease_ttl_seconds": default_ttl,
                "max_lease_ttl_seconds": max_ttl
            }
        }))
        .unwrap(),
    )
    .unwrap();
}

/// Run vaultmount against the mock server from a blocking thread.
async fn run_mock(server: &MockServer, argv: Vec<String>) -> (i32, String, String) {
    let addr = server.uri();
    tokio::task::spawn_blocking(move || {
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
        run_at(&addr, Some("root-token"), &argv)
    })
    .await
    .unwrap()
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| (*p).to_owned()).collect()
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0, "vaultmount --version should exit 0");
    assert!(stdout.contains("vaultmount"), "{stdout}");
}

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0);
    for sub in ["plan", "apply", "refresh", "destroy", "import", "show", "exists"] {
        assert!(stdout.contains(sub), "help should list '{sub}': {stdout}");
    }
}

// ── Offline behavior ─────────────────────────────────────────────────

#[test]
fn test_trailing_slash_rejected_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = ssh_config();
    cfg["path"] = json!("ssh-test/");
    let config = write_config(dir.path(), &cfg);
    let state = dir.path().join("state.json");

    let (code, _, stderr) = run(&[
        "--state",
        state.to_str().unwrap(),
        "apply",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_ne!(code, 0);
    assert!(stderr.contains("path cannot end in '/'"), "{stderr}");
    assert!(!stderr.contains("network"), "{stderr}");
    assert!(!state.exists());
}

#[test]
fn test_apply_without_token_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &ssh_config());
    let state = dir.path().join("state.json");

    let (code, _, stderr) = run_at(
        "http://127.0.0.1:19999",
        None,
        &[
            "--state",
            state.to_str().unwrap(),
            "apply",
            "--config",
            config.to_str().unwrap(),
        ],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("missing token"), "{stderr}");
}

#[test]
fn test_show_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let (code, stdout, _) = run(&["--state", state.to_str().unwrap(), "show"]);
    assert_eq!(code, 0);
    let shown: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shown["resource_type"], "vault_secret_backend");
    assert!(shown["resource"].is_null());
}

#[test]
fn test_exists_with_nothing_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let (code, _, _) = run(&["--state", state.to_str().unwrap(), "exists"]);
    assert_eq!(code, 1);
}

#[test]
fn test_exists_reports_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    seed_state(&state, "", 0, 0);

    let (code, _, stderr) = run(&["--state", state.to_str().unwrap(), "exists"]);
    assert_eq!(code, 2, "{stderr}");
    assert!(stderr.contains("error retrieving list of mounts"), "{stderr}");
}

// ── Against a mock Vault ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_apply_creates_mount_and_records_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/ssh-test"))
        .and(body_json(json!({
            "type": "ssh",
            "description": "test description",
            "config": { "default_lease_ttl": "3600s", "max_lease_ttl": "86400s" }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mounts_body(3600, 86_400)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &ssh_config());
    let state = dir.path().join("state.json");
    let addr = server.uri();

    let (code, stdout, stderr) = tokio::task::spawn_blocking({
        let config = config.clone();
        let state = state.clone();
        move || {
            run_at(
                &addr,
                Some("root-token"),
                &[
                    "--state",
                    state.to_str().unwrap(),
                    "apply",
                    "--config",
                    config.to_str().unwrap(),
                ],
            )
        }
    })
    .await
    .unwrap();
    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("create complete"), "{stdout}");

    let recorded: Value = serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    assert_eq!(
        recorded["resource"],
        json!({
            "id": "ssh-test",
            "path": "ssh-test",
            "type": "ssh",
            "description": "test description",
            "default_lease_ttl_seconds": 3600,
            "max_lease_ttl_seconds": 86400
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_then_plan_ttl_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mounts_body(3600, 86_400)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let mut updated = ssh_config();
    updated["default_lease_ttl_seconds"] = json!(1800);
    updated["max_lease_ttl_seconds"] = json!(43200);
    let config = write_config(dir.path(), &updated);
    let addr = server.uri();

    let (import, plan) = tokio::task::spawn_blocking({
        let state = state.clone();
        move || {
            let state = state.to_str().unwrap();
            let import = run_at(&addr, Some("root-token"), &["--state", state, "import", "ssh-test/"]);
            let plan = run_at(
                &addr,
                Some("root-token"),
                &["--state", state, "plan", "--config", config.to_str().unwrap()],
            );
            (import, plan)
        }
    })
    .await
    .unwrap();

    assert_eq!(import.0, 0, "{}", import.2);
    let recorded: Value = serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    assert_eq!(recorded["resource"]["id"], "ssh-test");
    assert_eq!(recorded["resource"]["max_lease_ttl_seconds"], 86400);

    assert_eq!(plan.0, 0, "{}", plan.2);
    assert!(plan.1.contains("Plan: update"), "{}", plan.1);
    assert!(plan.1.contains("default_lease_ttl_seconds"), "{}", plan.1);
    assert!(!plan.1.contains("forces replacement"), "{}", plan.1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_import_then_apply_tunes_ttls_in_place() {
    let server = MockServer::start().await;
    // import and the pre-apply refresh see the old TTLs, the post-tune read the new ones
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mounts_body(3600, 86_400)))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mounts_body(1800, 43_200)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/ssh-test/tune"))
        .and(body_json(json!({
            "default_lease_ttl": "1800s",
            "max_lease_ttl": "43200s"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/ssh-test"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let mut updated = ssh_config();
    updated["default_lease_ttl_seconds"] = json!(1800);
    updated["max_lease_ttl_seconds"] = json!(43200);
    let config = write_config(dir.path(), &updated);
    let state_arg = state.to_str().unwrap();

    let import = run_mock(&server, args(&["--state", state_arg, "import", "ssh-test"])).await;
    assert_eq!(import.0, 0, "{}", import.2);

    let (code, stdout, stderr) = run_mock(
        &server,
        args(&["--state", state_arg, "apply", "--config", config.to_str().unwrap()]),
    )
    .await;
    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("update complete"), "{stdout}");

    let recorded: Value = serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    assert_eq!(recorded["resource"]["id"], "ssh-test");
    assert_eq!(recorded["resource"]["default_lease_ttl_seconds"], 1800);
    assert_eq!(recorded["resource"]["max_lease_ttl_seconds"], 43200);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_apply_description_change_replaces_mount() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mounts_body(3600, 86_400)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(mounts_body_described("rotated hosts", 3600, 86_400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/sys/mounts/ssh-test"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/ssh-test"))
        .and(body_json(json!({
            "type": "ssh",
            "description": "rotated hosts",
            "config": { "default_lease_ttl": "3600s", "max_lease_ttl": "86400s" }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/ssh-test/tune"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    seed_state(&state, "test description", 3600, 86_400);
    let mut changed = ssh_config();
    changed["description"] = json!("rotated hosts");
    let config = write_config(dir.path(), &changed);

    let (code, stdout, stderr) = run_mock(
        &server,
        args(&[
            "--state",
            state.to_str().unwrap(),
            "apply",
            "--config",
            config.to_str().unwrap(),
        ]),
    )
    .await;
    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("Plan: replace"), "{stdout}");
    assert!(stdout.contains("forces replacement"), "{stdout}");
    assert!(stdout.contains("replace complete"), "{stdout}");

    let writes: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() != "GET")
        .map(|r| format!("{} {}", r.method.as_str(), r.url.path()))
        .collect();
    assert_eq!(
        writes,
        ["DELETE /v1/sys/mounts/ssh-test", "POST /v1/sys/mounts/ssh-test"],
        "unmount must precede the new mount"
    );

    let recorded: Value = serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    assert_eq!(recorded["resource"]["id"], "ssh-test");
    assert_eq!(recorded["resource"]["description"], "rotated hosts");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_after_out_of_band_unmount_clears_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "sys/": { "type": "system", "description": "system endpoints", "config": { "default_lease_ttl": 0, "max_lease_ttl": 0 } }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    seed_state(&state, "test description", 3600, 86_400);

    let (code, stdout, stderr) =
        run_mock(&server, args(&["--state", state.to_str().unwrap(), "refresh"])).await;
    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("no longer exists"), "{stdout}");

    let recorded: Value = serde_json::from_slice(&fs::read(&state).unwrap()).unwrap();
    assert_eq!(recorded["resource_type"], "vault_secret_backend");
    assert!(recorded["resource"].is_null(), "{recorded}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_destroy_unmounts_and_removes_state_file() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/sys/mounts/ssh-test"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    seed_state(&state, "test description", 3600, 86_400);

    let (code, stdout, stderr) =
        run_mock(&server, args(&["--state", state.to_str().unwrap(), "destroy"])).await;
    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");
    assert!(stdout.contains("unmounted \"ssh-test\""), "{stdout}");
    assert!(!state.exists(), "state file should be removed after destroy");
}
