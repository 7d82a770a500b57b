//! Headless mode integration tests.
//!
//! Library-level runs use the mock warehouse directly; the binary tests run
//! the built executables.

use super::common::mock_runner;
use snowpane::config::Config;
use snowpane::db::MockConnector;
use snowpane::query::QueryRequest;
use snowpane::tui::headless::{self, HeadlessConfig, HeadlessOutput, OutputFormat};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const MENU_SQL: &str = "SELECT truck_brand_name, COUNT(*) AS item_count FROM menu GROUP BY 1";

fn headless_config(format: OutputFormat, show_context: bool) -> HeadlessConfig {
    HeadlessConfig {
        request: Some(QueryRequest::new(MENU_SQL, true)),
        show_context,
        width: 120,
        height: 40,
        output_format: format,
        output_file: None,
    }
}

fn run_binary(binary: &str, args: &[&str], cwd: &Path) -> (i32, String, String) {
    let mut command = Command::new(binary);
    command.args(args).current_dir(cwd).env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("SNOWFLAKE_") {
            command.env_remove(key);
        }
    }

    let output = command.output().expect("Failed to execute command");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[tokio::test]
async fn test_headless_report_has_table_and_chart() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);
    let settings = Config::default();

    let report = headless::execute(
        &runner,
        &settings,
        &headless_config(OutputFormat::Text, true),
        "DEMO_USER@demo",
    )
    .await
    .unwrap();

    let outcome = report.outcome.as_ref().unwrap();
    assert!(outcome.sql.ends_with("\nLIMIT 200;"));
    assert_eq!(outcome.result.row_count, 6);
    assert_eq!(report.chart.as_ref().unwrap().bars.len(), 6);
    assert!(report.screen.is_none());

    let text = HeadlessOutput::new(OutputFormat::Text).format(&report);
    assert!(text.contains("Role       ANALYST"));
    assert!(text.contains("Freezing Point"));
    assert!(text.contains("ITEM_COUNT per TRUCK_BRAND_NAME"));
}

#[tokio::test]
async fn test_headless_json_output() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    let report = headless::execute(
        &runner,
        &Config::default(),
        &headless_config(OutputFormat::Json, false),
        "DEMO_USER@demo",
    )
    .await
    .unwrap();

    let json = HeadlessOutput::new(OutputFormat::Json).format(&report);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed["reconnected"], false);
    assert!(parsed.get("context").is_none());
    assert_eq!(parsed["result"]["row_count"], 6);
    assert_eq!(parsed["chart"]["bars"][0]["label"], "Freezing Point");
}

#[tokio::test]
async fn test_headless_screen_output() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    let report = headless::execute(
        &runner,
        &Config::default(),
        &headless_config(OutputFormat::Screen, true),
        "DEMO_USER@demo",
    )
    .await
    .unwrap();

    let screen = report.screen.as_deref().unwrap();
    assert!(screen.contains("Snowpane"));
    assert!(screen.contains("COMPUTE_WH"));
    assert!(screen.contains("SQL Query"));
    assert!(screen.contains("Kitakata Ramen Bar"));
}

#[tokio::test]
async fn test_headless_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.txt");
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    let mut config = headless_config(OutputFormat::Text, false);
    config.output_file = Some(path.clone());

    headless::run(&runner, &Config::default(), &config, "DEMO_USER@demo")
        .await
        .unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("TRUCK_BRAND_NAME"));
}

#[test]
fn test_binary_mock_db_json() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("absent.toml");
    let (code, stdout, _) = run_binary(
        env!("CARGO_BIN_EXE_snowpane"),
        &[
            "--mock-db",
            "--config",
            config_path.to_str().unwrap(),
            "-e",
            "SELECT 1",
            "--output",
            "json",
        ],
        dir.path(),
    );

    assert_eq!(code, 0);
    assert!(stdout.contains(r#""sql": "SELECT 1\nLIMIT 200;""#));
}

#[test]
fn test_binary_reports_missing_credentials() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("absent.toml");
    let (code, stdout, stderr) = run_binary(
        env!("CARGO_BIN_EXE_snowpane"),
        &["--config", config_path.to_str().unwrap(), "-e", "SELECT 1"],
        dir.path(),
    );

    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Missing environment variables"));
    assert!(stderr.contains("SNOWFLAKE_ACCOUNT"));
}

#[test]
fn test_smoke_binary_reports_missing_credentials() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_binary(env!("CARGO_BIN_EXE_snowpane-smoke"), &[], dir.path());

    assert_eq!(code, 1);
    assert!(stderr.contains("SNOWFLAKE_PASSWORD"));
}
