//! Runs the built executable

use std::process::{Command, Output};

use crate::common::{TestServer, HARDENED_RESPONSE};

const BIN: &str = env!("CARGO_BIN_EXE_watchdog");

async fn run(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        Command::new(BIN)
            .args(&args)
            .env("NO_COLOR", "1")
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_version_flag() {
    let output = run(vec!["--version".into()]).await;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn test_invalid_target_exits_with_one() {
    let output = run(vec!["--log-level".into(), "off".into(), "ftp://example.com".into()]).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported scheme"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_missing_config_file_exits_with_one() {
    let output = run(vec![
        "--config-file".into(),
        "/definitely/not/here.toml".into(),
        "https://example.com".into(),
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_json_output_for_completed_scan() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let output = run(vec![
        "--log-level".into(),
        "off".into(),
        "--json".into(),
        "--compliance".into(),
        server.url.clone(),
    ])
    .await;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["status"], "completed");
    assert_eq!(result["url"], server.url.as_str());
    assert_eq!(result["securityScore"], 80);
    assert_eq!(result["compliance"]["checks"].as_array().map(Vec::len), Some(6));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_table_output_for_completed_scan() {
    let server = TestServer::start(HARDENED_RESPONSE).await;
    let output = run(vec!["--log-level".into(), "off".into(), server.url.clone()]).await;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Security score"));
    assert!(stdout.contains("80/100"));
    assert!(stdout.contains("Findings: 1 high"));
}
