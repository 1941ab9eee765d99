//! End-to-end command tests over an offline directory

use cfl_cli::{command, run};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn snapshot_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let devices = dir.path().join("devices");
    fs::create_dir(&devices).unwrap();
    fs::write(dir.path().join("group.json"), r#"{"wifi": {"ssid": "net0"}}"#).unwrap();
    fs::write(devices.join("1001.json"), r#"{"wifi": {"ssid": "net1"}}"#).unwrap();
    fs::write(devices.join("1002.json"), r#"{"wifi": {"ssid": "net1"}}"#).unwrap();
    dir
}

async fn invoke(dir: &TempDir, args: &[&str]) -> anyhow::Result<String> {
    let offline = dir.path().to_str().unwrap().to_string();
    let mut argv = vec!["cfl"];
    argv.extend_from_slice(args);
    argv.extend_from_slice(&["--offline", offline.as_str()]);
    let matches = command().try_get_matches_from(argv)?;
    let mut out = Vec::new();
    run(&matches, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn chart_prints_parallel_sequences() {
    let dir = snapshot_dir();
    let out = invoke(&dir, &["chart"]).await.unwrap();
    let chart: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(chart["values"], json!([0, 3, 3, 2, 1]));
    assert_eq!(chart["parents"][1], json!("ROOT"));
}

#[tokio::test]
async fn chart_flags_apply() {
    let dir = snapshot_dir();
    let out = invoke(&dir, &["chart", "--exclude-group", "--with-sources"])
        .await
        .unwrap();
    let chart: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(chart["values"], json!([0, 2, 2, 2, 0]));
    assert_eq!(chart["labels"][4], json!("net0 []"));
}

#[tokio::test]
async fn show_defaults_to_root() {
    let dir = snapshot_dir();
    let out = invoke(&dir, &["show"]).await.unwrap();
    let subtree: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(subtree, json!({"ROOT": {"wifi": {"ssid": ["net1", "net0"]}}}));
}

#[tokio::test]
async fn show_yaml_for_node() {
    let dir = snapshot_dir();
    let out = invoke(&dir, &["show", "--node", "ROOT.wifi.ssid", "--yaml"])
        .await
        .unwrap();
    assert_eq!(out, "ssid:\n- net1\n- net0\n");
}

#[tokio::test]
async fn show_unknown_node_fails() {
    let dir = snapshot_dir();
    let err = invoke(&dir, &["show", "--node", "ROOT.lan"]).await.unwrap_err();
    assert!(format!("{err:#}").contains("ROOT.lan"));
}

#[tokio::test]
async fn stats_counts_nodes() {
    let dir = snapshot_dir();
    let out = invoke(&dir, &["stats"]).await.unwrap();
    let stats: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(stats["nodes"], json!(5));
    assert_eq!(stats["sources"], json!(3));
}

#[tokio::test]
async fn config_file_sets_chart_defaults() {
    let dir = snapshot_dir();
    let config = dir.path().join("layers.toml");
    fs::write(&config, "[chart]\nexclude_group = true\norder = \"sorted\"\n").unwrap();
    let out = invoke(&dir, &["chart", "--config", config.to_str().unwrap()])
        .await
        .unwrap();
    let chart: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(chart["labels"], json!(["", "wifi", "ssid", "net0", "net1"]));
    assert_eq!(chart["values"], json!([0, 2, 2, 0, 2]));
}
