use anyhow::Result;

/// Print every schema the provider serves
pub fn run() -> Result<()> {
    let schemas = super::server().schemas();
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}
