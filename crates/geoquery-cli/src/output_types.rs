use serde::Serialize;
use tabled::Tabled;

/// Output for query/devices commands that wrote a file
#[derive(Debug, Serialize)]
pub struct WriteOutput {
    pub input: String,
    pub output: String,
    pub crs: u32,
    pub count: usize,
}

/// Row of the schema command
#[derive(Debug, Serialize, Tabled)]
pub struct SchemaRow {
    #[tabled(rename = "Attribute")]
    pub attribute: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pub kind: String,
}

/// Row of the config command
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// Row of `devices --list-models`
#[derive(Debug, Serialize, Tabled)]
pub struct ModelRow {
    #[tabled(rename = "Model")]
    pub model: String,
    #[tabled(rename = "Devices")]
    pub devices: usize,
}

/// Output for `devices --states`
#[derive(Debug, Serialize)]
pub struct StateUpdateOutput {
    pub registry: String,
    pub updated: Vec<String>,
    pub unknown: Vec<String>,
}
