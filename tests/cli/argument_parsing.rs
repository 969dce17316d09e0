//! Arguments and configuration file resolved together

use clap::Parser;
use std::io::Write;
use tempfile::NamedTempFile;
use watchdog::app::cli::args::Args;
use watchdog::app::cli::config::{load_config_file, AppConfig};
use watchdog::scanner::api::ScanConfig;

#[tokio::test]
async fn test_file_and_flags_produce_engine_config() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
log-level = "warn"
output-dir = "/srv/watchdog"

[scan]
scanType = "deep"
timeout = 20
userAgent = "probe/1"
complianceScan = true
headers = {{ "X-Team" = "sec" }}
"#
    )
    .unwrap();

    let config_path = file.path().to_string_lossy().into_owned();
    let args = Args::try_parse_from([
        "watchdog",
        "--config-file",
        config_path.as_str(),
        "--timeout",
        "7",
        "--performance",
        "-H",
        "Authorization: Bearer t",
        "https://example.com/app",
    ])
    .unwrap();

    let table = load_config_file(args.config_file.as_deref()).await.unwrap();
    let config = AppConfig::resolve(&args, table.as_ref()).unwrap();
    assert_eq!(config.url, "https://example.com/app");
    assert_eq!(config.log_level.as_deref(), Some("warn"));

    let scan = ScanConfig::from_value(&config.scan);
    assert_eq!(scan.scan_type, "deep");
    assert_eq!(scan.timeout, 7);
    assert_eq!(scan.user_agent, "probe/1");
    assert!(scan.compliance_scan);
    assert!(scan.performance_scan);
    assert!(scan.vulnerability_scan);
    assert_eq!(scan.headers.len(), 2);
    assert_eq!(scan.total_tasks(), 12);
}

#[test]
fn test_defaults_without_configuration() {
    let args = Args::try_parse_from(["watchdog", "http://localhost:8080"]).unwrap();
    let config = AppConfig::resolve(&args, None).unwrap();

    assert_eq!(ScanConfig::from_value(&config.scan), ScanConfig::default());
    assert_eq!(config.output_dir, None);
}
