use crate::Context;
use crate::cli::ResourceAction;
use anyhow::Result;

/// Run one lifecycle operation against a managed resource
pub fn run(
    ctx: &Context,
    action: ResourceAction,
    resource: &str,
    state: &str,
    prior: Option<&str>,
) -> Result<()> {
    let server = super::configured_server(ctx)?;
    let type_name = super::qualify(resource);
    let value = super::read_json(state)?;

    log::info!("Running {action:?} on {type_name}");
    let response = match action {
        ResourceAction::Create => server.create(&type_name, value),
        ResourceAction::Read => server.read(&type_name, value),
        ResourceAction::Update => {
            let prior = match prior {
                Some(source) => super::read_json(source)?,
                None => value.clone(),
            };
            server.update(&type_name, prior, value)
        }
        ResourceAction::Delete => server.delete(&type_name, value),
    };

    super::emit(ctx, &response)
}
