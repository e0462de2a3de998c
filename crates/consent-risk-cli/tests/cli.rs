use std::fs::write;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

const DEFAULT_ENDPOINT: &str = "https://swai-backend.onrender.com/api/check";

fn golden_text() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../consent-risk-core/tests/fixtures/golden_consent.txt");
    std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()))
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("consent-risk-cli").unwrap();
    cmd.env_remove("CONSENT_RISK_ENDPOINT")
        .env_remove("CONSENT_RISK_TIMEOUT_SECS")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn analyze_scores_stdin_with_heuristic() {
    cli()
        .arg("analyze")
        .write_stdin(golden_text())
        .assert()
        .success()
        .stdout(predicate::str::contains("Risk Score: 51 (moderate)"))
        .stdout(predicate::str::contains("Retention period: 5 years or more"));
}

#[test]
fn analyze_emits_json() {
    let output = cli()
        .args(["analyze", "--format", "json"])
        .write_stdin(golden_text())
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["score"], serde_json::json!(51));
    assert_eq!(value["label"], serde_json::json!("moderate"));
    assert_eq!(value["bullets"].as_array().map(Vec::len), Some(6));
}

#[test]
fn analyze_reads_file_and_explains() {
    let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write(file.path(), "광고 동의 거부").unwrap();
    cli()
        .args(["analyze", "--explain", "--file", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Risk Score: 5 (low)"))
        .stdout(predicate::str::contains("Breakdown:"));
}

#[test]
fn blank_input_has_no_content() {
    cli()
        .arg("analyze")
        .write_stdin("   \n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Risk Score: 0 (no content)"));
}

#[test]
fn remote_analysis_skips_network_for_blank_input() {
    cli()
        .args(["analyze", "--remote", "--endpoint", "http://127.0.0.1:9/api"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("no content"));
}

#[test]
fn endpoint_option_requires_remote() {
    cli()
        .args(["analyze", "--endpoint", "https://example.test/api"])
        .write_stdin("text")
        .assert()
        .failure();
}

#[test]
fn blank_input_with_byte_order_mark_has_no_content() {
    cli()
        .arg("analyze")
        .write_stdin("\u{feff}  \n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Risk Score: 0 (no content)"));
}

#[test]
fn explain_conflicts_with_remote() {
    cli()
        .args(["analyze", "--remote", "--explain"])
        .write_stdin("text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--explain"));
}

#[test]
fn zero_timeout_is_rejected() {
    cli()
        .args(["analyze", "--remote", "--timeout", "0s"])
        .write_stdin("text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout must be greater than zero"));
}

#[test]
fn sample_prints_bundled_notice() {
    cli()
        .arg("sample")
        .assert()
        .success()
        .stdout(predicate::str::contains("개인정보 수집·이용 동의서"));
}

#[test]
fn lexicon_is_default_command() {
    cli()
        .assert()
        .success()
        .stdout(predicate::str::contains("group(s)"))
        .stdout(predicate::str::contains("third_party"));
}

#[test]
fn lexicon_json_lists_groups() {
    let output = cli().args(["lexicon", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["groups"].as_array().map(Vec::len), Some(9));
    assert_eq!(value["groups"][0]["id"], serde_json::json!("third_party"));
}

#[test]
fn endpoint_defaults_to_compiled_value() {
    cli()
        .arg("endpoint")
        .assert()
        .success()
        .stdout(predicate::str::contains(DEFAULT_ENDPOINT));
}

#[test]
fn endpoint_rejects_page_url_override() {
    cli()
        .args([
            "endpoint",
            "--endpoint",
            "https://ward.example/analysis-result.html?text=abc",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(DEFAULT_ENDPOINT));
}

#[test]
fn endpoint_reads_environment_override() {
    cli()
        .env("CONSENT_RISK_ENDPOINT", "https://staging.example/api/check")
        .arg("endpoint")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://staging.example/api/check"));
}

#[test]
fn endpoint_reads_config_file() {
    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write(
        file.path(),
        "[analyzer]\nendpoint = \"https://config.example/api/check\"\ntimeout_secs = 10\n",
    )
    .unwrap();
    cli()
        .args(["--config", file.path().to_str().unwrap(), "endpoint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://config.example/api/check"));
}

#[test]
fn environment_takes_precedence_over_config_file() {
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write(
        file.path(),
        "analyzer:\n  endpoint: \"https://config.example/api/check\"\n",
    )
    .unwrap();
    cli()
        .env("CONSENT_RISK_ENDPOINT", "https://env.example/api/check")
        .args(["--config", file.path().to_str().unwrap(), "endpoint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://env.example/api/check"));
}

#[test]
#[ignore = "requires loopback networking"]
fn remote_failure_falls_back_to_heuristic() {
    cli()
        .args([
            "analyze",
            "--remote",
            "--endpoint",
            "http://127.0.0.1:9/api",
            "--fallback",
            "--timeout",
            "2s",
        ])
        .write_stdin(golden_text())
        .assert()
        .success()
        .stdout(predicate::str::contains("Risk Score: 51 (moderate)"));
}

#[test]
#[ignore = "requires loopback networking"]
fn remote_failure_without_fallback_exits_with_error() {
    cli()
        .args(["analyze", "--remote", "--endpoint", "http://127.0.0.1:9/api"])
        .write_stdin(golden_text())
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote analysis failed"));
}
