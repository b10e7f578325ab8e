use clap::{Parser, Subcommand};
use geoquery_core::config::parse_crs;
use geoquery_core::{BBox, SortDirection};
use std::path::PathBuf;

/// GeoQuery - query GeoJSON documents from the command line
#[derive(Parser, Debug)]
#[command(name = "geoquery")]
#[command(about = "In-memory GeoJSON query engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./geoquery.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// CRS recorded for inputs that declare none (e.g. 4326 or EPSG:25831)
    #[arg(long, global = true, value_name = "EPSG", value_parser = parse_crs)]
    pub crs: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter, sort, page and project a GeoJSON document
    Query(QueryArgs),

    /// Infer attribute types of a GeoJSON document
    Schema(SchemaArgs),

    /// Find the features whose identifier field equals a value
    Identify(IdentifyArgs),

    /// Export a smart-plug device registry as a GeoJSON layer
    Devices(DevicesArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// GeoJSON file to query
    pub input: PathBuf,

    /// Keep features with a coordinate inside min_x,min_y,max_x,max_y
    /// Without a value the configured default_bbox is used
    #[arg(long, value_name = "BBOX", num_args = 0..=1, allow_hyphen_values = true)]
    pub bbox: Option<Option<BBox>>,

    /// SQL-like attribute filter
    /// Example: --where "cat = 'A' AND NOT (height >= 20)"
    #[arg(long = "where", value_name = "FILTER")]
    pub filter: Option<String>,

    /// Property to sort by
    #[arg(long, value_name = "KEY")]
    pub sort: Option<String>,

    /// Sort order (asc or desc); defaults to the configured sort_direction
    #[arg(long, value_name = "ORDER")]
    pub order: Option<SortDirection>,

    /// Skip the first N features
    #[arg(long, value_name = "N")]
    pub offset: Option<usize>,

    /// Return at most N features
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Return only these properties, without geometry (comma-separated)
    #[arg(long, value_name = "KEYS", value_delimiter = ',')]
    pub select: Option<Vec<String>>,

    /// Return all properties without geometry
    #[arg(long)]
    pub drop_geometry: bool,

    /// Number features in source order before filtering
    /// Without a value the configured id_field is used
    #[arg(long, value_name = "FIELD", num_args = 0..=1)]
    pub assign_id: Option<Option<String>>,

    /// Write the result to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// GeoJSON file to inspect
    pub input: PathBuf,
}

#[derive(Parser, Debug)]
pub struct IdentifyArgs {
    /// GeoJSON file to search
    pub input: PathBuf,

    /// Identifier value (numbers, booleans and null are recognized)
    #[arg(long)]
    pub value: String,

    /// Identifier property; defaults to the configured id_field
    #[arg(long)]
    pub field: Option<String>,

    /// Number features into the identifier field before searching
    #[arg(long)]
    pub assign_id: bool,
}

#[derive(Parser, Debug)]
pub struct DevicesArgs {
    /// Device registry JSON file
    pub registry: PathBuf,

    /// Only export devices of this product model
    #[arg(long)]
    pub model: Option<String>,

    /// List product models instead of exporting
    #[arg(long)]
    pub list_models: bool,

    /// Apply discovery payloads (JSON object keyed by device id) and save the registry
    #[arg(long, value_name = "FILE")]
    pub states: Option<PathBuf>,

    /// Write the GeoJSON layer to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}
