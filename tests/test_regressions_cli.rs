use httpmock::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_logsearch")
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(["--color", "never"])
        .args(args)
        .env_remove("LOGSEARCH_API_URL")
        .env_remove("RUST_LOG")
        .output()
        .expect("command should run")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write test file");
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_query_prints_serialized_filters() {
    let output = run(&[
        "query",
        "-w",
        "level=ERROR",
        "-w",
        "message~\"disk full\"",
        "--from",
        "2024-01-01T00:00:00Z",
        "--to",
        "2024-01-02T00:00:00Z",
    ]);

    assert_eq!(
        stdout_json(&output),
        json!({
            "filters": [
                {"field": "level", "operator": "=", "value": "ERROR"},
                {"field": "message", "operator": "~", "value": "disk full"}
            ],
            "startDate": "2024-01-01T00:00:00+00:00",
            "endDate": "2024-01-02T00:00:00+00:00"
        })
    );
}

#[test]
fn test_query_with_only_from_omits_dates() {
    let output = run(&["query", "-w", "level=ERROR", "--from", "2024-01-01T00:00:00Z"]);
    let value = stdout_json(&output);
    assert!(value.get("startDate").is_none());
    assert!(value.get("endDate").is_none());
}

#[test]
fn test_dry_run_below_minimum_is_rejected() {
    let output = run(&[
        "search",
        "--dry-run",
        "--min-filters",
        "3",
        "-w",
        "level=ERROR",
        "-w",
        "commit=abc",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Filter configuration is incomplete"),
        "stderr: {stderr}"
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn test_minimum_comes_from_config_file() {
    let dir = tempdir().expect("temp dir");
    let config = dir.path().join("logsearch.toml");
    write_file(&config, "min_complete_filters = 2\n");

    let rejected = run(&[
        "--config",
        config.to_str().expect("utf8 path"),
        "search",
        "--dry-run",
        "-w",
        "level=ERROR",
    ]);
    assert!(!rejected.status.success());

    let accepted = run(&[
        "--config",
        config.to_str().expect("utf8 path"),
        "search",
        "--dry-run",
        "-w",
        "level=ERROR",
        "-w",
        "spanId=s-1",
    ]);
    assert_eq!(stdout_json(&accepted)["filters"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_invalid_filter_term_fails() {
    let output = run(&["query", "-w", "host=web"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown field: 'host'"));
}

#[test]
fn test_search_without_api_url_fails() {
    let output = run(&["search", "-w", "level=ERROR"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No query service configured"));
}

#[test]
fn test_search_json_written_to_output_file() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/.netlify/functions/query")
            .json_body(json!({"filters": [{"field": "level", "operator": "=", "value": "ERROR"}]}));
        then.status(200)
            .json_body(json!([{"level": "ERROR", "message": "disk full", "commit": "abc"}]));
    });

    let dir = tempdir().expect("temp dir");
    let out = dir.path().join("records.json");
    let output = run(&[
        "--api-url",
        &server.base_url(),
        "-F",
        "json",
        "-o",
        out.to_str().expect("utf8 path"),
        "search",
        "-w",
        "level=ERROR",
    ]);

    mock.assert();
    let printed = stdout_json(&output);
    assert_eq!(printed[0]["message"], "disk full");

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("output file should exist"))
            .expect("file should hold JSON");
    assert_eq!(written, printed);
}

#[test]
fn test_search_text_shows_table() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/.netlify/functions/query");
        then.status(200)
            .json_body(json!([{"level": "WARN", "message": "slow query", "resourceId": "db-1"}]));
    });

    let output = run(&["--api-url", &server.base_url(), "search", "-w", "level=WARN"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SEARCH returned 1 record"));
    assert!(stdout.contains("slow query"));
    assert!(stdout.contains("db-1"));
}

#[test]
fn test_search_server_error_is_visible() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/.netlify/functions/query");
        then.status(500).body("boom");
    });

    let output = run(&["--api-url", &server.base_url(), "search", "-w", "level=WARN"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Search failed"), "stderr: {stderr}");
    assert!(stderr.contains("500"), "stderr: {stderr}");
}

#[test]
fn test_fields_lists_wire_names() {
    let output = run(&["fields"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("metadata.parentResourceId"));
    assert!(stdout.contains("!~"));
}

#[test]
fn test_console_reads_commands_from_stdin() {
    let mut child = Command::new(bin())
        .args(["--color", "never", "--quiet", "console"])
        .env_remove("LOGSEARCH_API_URL")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("console should start");

    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"set 0 level=ERROR\nadd commit=abc\nrm 1\nquery\nquit\n")
        .expect("write script");

    let output = child.wait_with_output().expect("console should exit");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("removed row 1: commit = abc"));
    assert!(stdout.contains("\"value\": \"ERROR\""));
    assert!(!stdout.contains("\"value\": \"abc\""));
}
