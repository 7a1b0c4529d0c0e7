//! Integration tests for the `mwdns` CLI binary.
//!
//! Argument parsing and offline commands run without a backend; the
//! session-bound commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `mwdns` binary with env isolation.
///
/// Clears all `MWDNS_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn mwdns_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("mwdns");
    cmd.env("HOME", "/tmp/mwdns-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/mwdns-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("MWDNS_PROFILE")
        .env_remove("MWDNS_SERVER")
        .env_remove("MWDNS_DOMAIN")
        .env_remove("MWDNS_IDENTITY")
        .env_remove("MWDNS_OUTPUT")
        .env_remove("MWDNS_INSECURE");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a blocking command while the wiremock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn stored(id: u32, name: &str, rrtype: u16, extra: serde_json::Value) -> serde_json::Value {
    let mut record = json!({
        "Hdr": {"Name": name, "Rrtype": rrtype, "Class": 1, "Ttl": 60, "Rdlength": 0}
    });
    for (k, v) in extra.as_object().unwrap() {
        record[k] = v.clone();
    }
    json!({"id": id, "record": record})
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = mwdns_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    mwdns_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("records")
            .and(predicate::str::contains("requests"))
            .and(predicate::str::contains("schema")),
    );
}

#[test]
fn test_version_flag() {
    mwdns_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mwdns"));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    mwdns_cmd().arg("frobnicate").assert().code(2);
}

#[test]
fn test_field_without_equals_is_rejected() {
    let output = mwdns_cmd()
        .args(["records", "create", "www", "A", "--field", "1.2.3.4"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("NAME=VALUE"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    mwdns_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_invalid_shell() {
    mwdns_cmd().args(["completions", "tcsh"]).assert().failure();
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_schema_lists_types() {
    mwdns_cmd()
        .args(["schema", "--output", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("CNAME")
                .and(predicate::str::contains("SRV"))
                .and(predicate::str::contains("TXT")),
        );
}

#[test]
fn test_schema_for_type_ends_with_ttl() {
    let output = mwdns_cmd()
        .args(["schema", "mx", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, ["Preference", "Mx", "ttl"]);
}

#[test]
fn test_schema_unknown_type() {
    mwdns_cmd()
        .args(["schema", "HINFO"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown record type"));
}

#[test]
fn test_config_path() {
    mwdns_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_redacts_identity() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("mwdns");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[profiles.default]\ndomain = \"orange-tiger\"\nidentity = \"s3cret\"\n",
    )
    .unwrap();

    let output = mwdns_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(!text.contains("s3cret"), "identity leaked:\n{text}");
}

#[test]
fn test_missing_domain_is_usage_error() {
    mwdns_cmd()
        .args(["records", "list", "--server", "http://127.0.0.1:9"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No domain configured"));
}

#[test]
fn test_delete_without_tty_needs_yes() {
    mwdns_cmd()
        .args([
            "records",
            "delete",
            "7",
            "--server",
            "http://127.0.0.1:9",
            "--domain",
            "example",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

// ── Against a backend ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_records_list_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/domains/example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored(1, "www.example.messwithdns.com.", 1, json!({"A": "1.2.3.4"})),
            stored(2, "example.messwithdns.com.", 16, json!({"Txt": ["hello", "world"]})),
        ])))
        .mount(&server)
        .await;

    let mut cmd = mwdns_cmd();
    cmd.args(["records", "list", "-o", "plain", "--server", &server.uri(), "--identity", "example"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        ["1\twww\tA\t60\t1.2.3.4", "2\t@\tTXT\t60\thelloworld"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_records_create_posts_wire_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/record/new"))
        .and(body_json(json!({
            "Hdr": {"Name": "www.example.messwithdns.com.", "Rrtype": 5, "Class": 1, "Ttl": 300, "Rdlength": 0},
            "Target": "orange.example.net."
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domains/example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&server)
        .await;

    let mut cmd = mwdns_cmd();
    cmd.args([
        "records",
        "create",
        "www",
        "cname",
        "--field",
        "Target= orange.example.net ",
        "--ttl",
        "300",
        "--server",
        &server.uri(),
        "--domain",
        "example",
    ]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Record created"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_write_prints_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/record/new"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid IPv4 address: 1.2.3"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/domains/example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = mwdns_cmd();
    cmd.args([
        "records",
        "create",
        "@",
        "A",
        "-f",
        "A=1.2.3",
        "--server",
        &server.uri(),
        "--domain",
        "example",
    ]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(6));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid IPv4 address: 1.2.3"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_requests_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "created_at": 1_700_000_000_i64,
            "request": "{\"Question\":[{\"Name\":\"www.example.messwithdns.com.\",\"Qtype\":1,\"Qclass\":1}]}",
            "response": "{\"Rcode\":3,\"Answer\":null}",
            "src_ip": "9.9.9.9",
            "src_host": "dns9.quad9.net."
        }])))
        .mount(&server)
        .await;

    let mut cmd = mwdns_cmd();
    cmd.args([
        "requests",
        "list",
        "-o",
        "json-compact",
        "--server",
        &server.uri(),
        "--domain",
        "example",
    ]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["query"]["name"], "www.example.messwithdns.com.");
    assert_eq!(parsed[0]["query"]["type"], "A");
    assert_eq!(parsed[0]["response"]["code"], "NXDOMAIN");
}
