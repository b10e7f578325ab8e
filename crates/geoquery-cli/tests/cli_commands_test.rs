//! Integration tests running the geoquery binary
//!
//! Every test works in its own temporary directory so no geoquery.toml
//! from the environment is picked up.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const CATEGORIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {"cat": "A", "name": "first"}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [5, 5]}, "properties": {"cat": "B", "name": "second"}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [20, 20]}, "properties": {"cat": "A", "name": "third"}}
    ]
}"#;

fn geoquery_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_geoquery"))
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("categories.geojson"), CATEGORIES).unwrap();
    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(geoquery_bin())
        .current_dir(dir)
        .env_remove("GEOQUERY_CRS")
        .env_remove("GEOQUERY_ID_FIELD")
        .env_remove("GEOQUERY_BBOX")
        .env_remove("GEOQUERY_SORT_DIRECTION")
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn json_data(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");
    parsed["data"].clone()
}

#[test]
fn test_query_bbox_and_filter() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &["query", "categories.geojson", "--bbox=-1,-1,10,10", "--where", "cat = 'A'", "--json"],
    );

    let data = json_data(&output);
    assert_eq!(data["type"], "FeatureCollection");
    let features = data["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["name"], "first");
}

#[test]
fn test_query_sort_page_and_select() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &[
            "query",
            "categories.geojson",
            "--assign-id",
            "--sort",
            "name",
            "--order",
            "desc",
            "--offset",
            "1",
            "--limit",
            "1",
            "--select",
            "ID_OGR,name",
            "--json",
        ],
    );

    let data = json_data(&output);
    assert_eq!(data, serde_json::json!([{"name": "second", "ID_OGR": 1}]));
}

#[test]
fn test_query_limit_zero_keeps_type() {
    let dir = workspace();
    let data = json_data(&run(dir.path(), &["query", "categories.geojson", "--limit", "0", "--json"]));
    assert_eq!(data, serde_json::json!({"type": "FeatureCollection", "features": []}));
}

#[test]
fn test_query_writes_output_file() {
    let dir = workspace();
    let output = run(
        dir.path(),
        &["query", "categories.geojson", "--where", "NOT (cat = 'A')", "--output", "out.geojson", "--json"],
    );

    let data = json_data(&output);
    assert_eq!(data["count"], 1);
    assert_eq!(data["crs"], 4326);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out.geojson")).unwrap()).unwrap();
    assert_eq!(written["features"][0]["geometry"]["coordinates"], serde_json::json!([5.0, 5.0]));
}

#[test]
fn test_query_invalid_filter_fails() {
    let dir = workspace();
    let output = run(dir.path(), &["query", "categories.geojson", "--where", "cat = = 'A'"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid filter syntax"), "stderr: {}", stderr);
}

#[test]
fn test_unsupported_extension_fails() {
    let dir = workspace();
    fs::write(dir.path().join("parcels.shp"), "").unwrap();

    let output = run(dir.path(), &["schema", "parcels.shp"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported format"));
}

#[test]
fn test_schema_command() {
    let dir = workspace();
    let data = json_data(&run(dir.path(), &["schema", "categories.geojson", "--json"]));
    assert_eq!(data, serde_json::json!({"cat": {"type": "string"}, "name": {"type": "string"}}));

    let human = run(dir.path(), &["schema", "categories.geojson"]);
    assert!(human.status.success());
    assert!(String::from_utf8_lossy(&human.stdout).contains("string"));
}

#[test]
fn test_identify_uses_configured_id_field() {
    let dir = workspace();
    fs::write(dir.path().join("geoquery.toml"), "id_field = \"fid\"\n").unwrap();

    let data = json_data(&run(
        dir.path(),
        &["identify", "categories.geojson", "--assign-id", "--value", "2", "--json"],
    ));
    let features = data["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["fid"], 2);
    assert_eq!(features[0]["properties"]["name"], "third");

    let missing = run(dir.path(), &["identify", "categories.geojson", "--assign-id", "--value", "9"]);
    assert!(!missing.status.success());
}

#[test]
fn test_config_command_reports_sources() {
    let dir = workspace();
    fs::write(dir.path().join("custom.toml"), "sort_direction = \"desc\"\n").unwrap();

    let output = Command::new(geoquery_bin())
        .current_dir(dir.path())
        .env("GEOQUERY_CRS", "3857")
        .env_remove("GEOQUERY_ID_FIELD")
        .env_remove("GEOQUERY_BBOX")
        .env_remove("GEOQUERY_SORT_DIRECTION")
        .args(["--config", "custom.toml", "config", "--json"])
        .output()
        .expect("Failed to execute command");

    let data = json_data(&output);
    let rows = data.as_array().unwrap();
    let row = |key: &str| rows.iter().find(|r| r["key"] == key).cloned().unwrap();

    assert_eq!(row("crs")["value"], "EPSG:3857");
    assert_eq!(row("crs")["source"], "Environment");
    assert_eq!(row("sort_direction")["value"], "desc");
    assert_eq!(row("sort_direction")["source"], "File");
    assert_eq!(row("id_field")["source"], "Default");
}

#[test]
fn test_crs_flag_overrides_environment() {
    let dir = workspace();

    let output = Command::new(geoquery_bin())
        .current_dir(dir.path())
        .env("GEOQUERY_CRS", "3857")
        .args(["--crs", "EPSG:25831", "config", "--json"])
        .output()
        .expect("Failed to execute command");

    let data = json_data(&output);
    let crs = data.as_array().unwrap().iter().find(|r| r["key"] == "crs").cloned().unwrap();
    assert_eq!(crs["value"], "EPSG:25831");
    assert_eq!(crs["source"], "Cli");

    let written = json_data(&run(
        dir.path(),
        &["query", "categories.geojson", "--crs", "25831", "-o", "copy.geojson", "--json"],
    ));
    assert_eq!(written["crs"], 25831);
    assert_eq!(written["count"], 3);
}

#[test]
fn test_devices_refresh_and_export() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("devices.json"),
        r#"{
            "1000aaaa01": {
                "extra": {"lat": 41.38, "long": 2.17},
                "ewelinkData": {"deviceid": "1000aaaa01", "devicekey": "k1", "productModel": "S26"}
            },
            "1000aaaa02": {
                "extra": {},
                "ewelinkData": {"deviceid": "1000aaaa02", "devicekey": "k2", "productModel": "POWR2"}
            }
        }"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("states.json"),
        r#"{
            "1000aaaa01": {"data1": "{\"switch\":\"on\"}"},
            "1000aaaa02": {"data1": "{\"switch\":", "data2": "\"off\"}"},
            "ffffffff": {"data1": "{}"}
        }"#,
    )
    .unwrap();

    // exporting before any refresh is rejected
    let early = run(dir.path(), &["devices", "devices.json"]);
    assert!(!early.status.success());

    let refreshed = json_data(&run(dir.path(), &["devices", "devices.json", "--states", "states.json", "--json"]));
    assert_eq!(refreshed["updated"], serde_json::json!(["1000aaaa01", "1000aaaa02"]));
    assert_eq!(refreshed["unknown"], serde_json::json!(["ffffffff"]));

    let models = json_data(&run(dir.path(), &["devices", "devices.json", "--list-models", "--json"]));
    assert_eq!(
        models,
        serde_json::json!([{"model": "S26", "devices": 1}, {"model": "POWR2", "devices": 1}])
    );

    let layer = json_data(&run(dir.path(), &["devices", "devices.json", "--json"]));
    let features = layer["features"].as_array().unwrap();
    // the POWR2 plug has no coordinates
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["id"], "1000aaaa01");
    assert_eq!(features[0]["properties"]["state"]["data"]["switch"], "on");
}
