use crate::cli::SchemaArgs;
use crate::output::OutputWriter;
use crate::output_types::SchemaRow;
use anyhow::Result;
use geoquery_core::infer_attribute_schema;

pub fn execute(args: SchemaArgs, output: &OutputWriter) -> Result<()> {
    let dataset = super::read_document(&args.input)?;
    let schema = infer_attribute_schema(&dataset.collection);

    if output.is_json() {
        return output.result(schema);
    }

    let rows = schema
        .iter()
        .map(|(attribute, descriptor)| SchemaRow {
            attribute: attribute.clone(),
            kind: descriptor.kind.to_string(),
        })
        .collect();
    output.table(rows);
    Ok(())
}
