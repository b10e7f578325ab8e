//! Integration tests for layered configuration
//!
//! Precedence: CLI arguments > environment variables > config file > defaults

use geoquery_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use geoquery_core::{BBox, SortDirection};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_VARS: [&str; 4] = [
    "GEOQUERY_CRS",
    "GEOQUERY_ID_FIELD",
    "GEOQUERY_BBOX",
    "GEOQUERY_SORT_DIRECTION",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_partial_file_configuration() {
    let file = config_file(r#"id_field = "fid""#);

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.id_field.value, "fid");
    assert_eq!(config.id_field.source, ConfigSource::File);
    assert_eq!(config.crs.value, 4326);
    assert_eq!(config.crs.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();

    let file = config_file(
        r#"
crs = 3857
id_field = "fid"
"#,
    );

    env::set_var("GEOQUERY_CRS", "EPSG:25831");
    env::set_var("GEOQUERY_BBOX", "0,40,4,43");
    env::set_var("GEOQUERY_SORT_DIRECTION", "desc");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.crs.value, 25831);
    assert_eq!(config.crs.source, ConfigSource::Environment);
    assert_eq!(config.id_field.value, "fid");
    assert_eq!(config.id_field.source, ConfigSource::File);
    assert_eq!(config.default_bbox.value, BBox::new(0.0, 40.0, 4.0, 43.0).unwrap());
    assert_eq!(config.sort_direction.value, SortDirection::Descending);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();

    env::set_var("GEOQUERY_CRS", "not-a-code");
    env::set_var("GEOQUERY_BBOX", "10,10,0,0");
    env::set_var("GEOQUERY_ID_FIELD", "   ");
    env::set_var("GEOQUERY_SORT_DIRECTION", "sideways");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.crs.source, ConfigSource::Default);
    assert_eq!(config.default_bbox.source, ConfigSource::Default);
    assert_eq!(config.id_field.value, "ID_OGR");
    assert_eq!(config.sort_direction.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    clear_env();
    env::set_var("GEOQUERY_ID_FIELD", "env_id");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.id_field.value, "env_id");

    config.update_from_cli(CliConfigOverrides {
        id_field: Some("cli_id".to_string()),
        sort_direction: Some(SortDirection::Descending),
        ..Default::default()
    });

    assert_eq!(config.id_field.value, "cli_id");
    assert_eq!(config.id_field.source, ConfigSource::Cli);
    assert_eq!(config.sort_direction.source, ConfigSource::Cli);

    let map = config.to_inspection_map();
    assert_eq!(map["id_field"], ("cli_id".to_string(), ConfigSource::Cli));
    assert_eq!(map["default_bbox"], ("-180,-90,180,90".to_string(), ConfigSource::Default));

    clear_env();
}

#[test]
fn test_invalid_toml_file() {
    let file = config_file("crs = [not toml");
    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
}

#[test]
fn test_missing_config_file() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/geoquery.toml");
    assert!(result.is_err());
}
