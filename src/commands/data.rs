use crate::Context;
use anyhow::Result;
use serde_json::json;

/// Look up one object through a data source
pub fn run(ctx: &Context, data_source: &str, id: &str) -> Result<()> {
    let server = super::configured_server(ctx)?;
    let type_name = super::qualify(data_source);

    log::info!("Reading {type_name} {id}");
    let response = server.read_data_source(&type_name, json!({ "id": id }));
    super::emit(ctx, &response)
}
