//! End-to-end sessions over the line-delimited transport

use clap::Parser;
use serde_json::{json, Value};
use tempfile::TempDir;

use nexus_config::NexusConfig;
use nexus_server::cli::Cli;
use nexus_server::{build_host, resolve_config, transport};

fn config_for(dir: &TempDir, bundles: &[&str]) -> NexusConfig {
    NexusConfig::default().with_overrides(
        Some(dir.path().join("vault")),
        Some(bundles.iter().map(|b| b.to_string()).collect()),
    )
}

async fn session(config: &NexusConfig, input: &str) -> Vec<Value> {
    let mut host = build_host(config).await.unwrap();
    let mut output: Vec<u8> = Vec::new();
    transport::serve(&mut host, input.as_bytes(), &mut output)
        .await
        .unwrap();
    assert!(host.bundle_names().is_empty(), "host not stopped at EOF");

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_session_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &["vault", "goals"]);

    let input = [
        r#"{"id": 1, "method": "tools/list"}"#,
        r#"{"id": 2, "method": "tools/call", "params": {"name": "create_goal", "arguments": {"title": "Ship", "priority": "high", "due": "2031-05-01"}}}"#,
        "",
        r#"{"id": 3, "method": "tools/call", "params": {"name": "query_documents", "arguments": {"query": "FROM \"goals\" WHERE priority = high TABLE title"}}}"#,
        r#"{"id": 4, "method": "tools/call", "params": {"name": "create_insight", "arguments": {}}}"#,
        "garbage",
        r#"{"id": 5, "method": "resources/read", "params": {"uri": "nexus://documents"}}"#,
    ]
    .join("\n");

    let responses = session(&config, &input).await;
    assert_eq!(responses.len(), 6);

    let tools: Vec<&str> = responses[0]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(tools.contains(&"create_document"));
    assert!(tools.contains(&"list_goals"));
    assert!(!tools.contains(&"create_insight"));
    assert!(responses[0]["tools"][0]["inputSchema"].is_object());

    assert_eq!(responses[1]["id"], json!(2));
    assert!(responses[1]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("goals/ship.md"));
    assert!(dir.path().join("vault/goals/ship.md").is_file());

    assert_eq!(
        responses[2]["content"][0]["text"],
        json!("| title |\n| --- |\n| Ship |")
    );

    // journal bundle is not loaded
    assert_eq!(responses[3]["error"]["kind"], json!("operation_not_found"));
    assert_eq!(responses[4]["error"]["kind"], json!("parse_error"));

    let text = responses[5]["contents"][0]["text"].as_str().unwrap();
    let paths: Value = serde_json::from_str(text).unwrap();
    assert_eq!(paths, json!(["goals/ship.md"]));
}

#[tokio::test]
async fn test_empty_input_stops_cleanly() {
    let dir = TempDir::new().unwrap();
    let responses = session(&config_for(&dir, &["vault"]), "").await;
    assert!(responses.is_empty());
    assert!(dir.path().join("vault").is_dir());
}

#[test]
fn test_flags_override_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "root = \"docs\"\nbundles = [\"journal\"]\n").unwrap();

    let cli = Cli::parse_from([
        "nexus-server",
        "--config",
        config_path.to_str().unwrap(),
        "--bundles",
        "vault,goals",
    ]);
    let config = resolve_config(&cli).unwrap();
    assert_eq!(config.bundles, vec!["vault", "goals"]);

    let cli = Cli::parse_from([
        "nexus-server",
        "--config",
        config_path.to_str().unwrap(),
        "--bundles",
        "vault,calendar",
    ]);
    assert!(resolve_config(&cli).is_err());
}
