//! Harness commands
//!
//! Each command builds a [`ProviderServer`], runs one or more calls and
//! prints resulting state as JSON on stdout. Diagnostics go to stderr and
//! any error diagnostic makes the command fail.

pub mod batch;
pub mod data;
pub mod resource;
pub mod schema;

use crate::Context;
use crate::config;
use crate::provider::{PROVIDER_TYPE_NAME, YoloProvider};
use crate::ui;
use anyhow::{Context as AnyhowContext, Result, bail};
use declarative::{ProviderServer, Response};
use serde_json::Value;
use std::fs;
use std::io;

/// Provider version, set at build time through `YOLOEXP_VERSION`
pub fn provider_version() -> &'static str {
    option_env!("YOLOEXP_VERSION").unwrap_or("dev")
}

/// Build an unconfigured server
pub fn server() -> ProviderServer<YoloProvider> {
    ProviderServer::new(YoloProvider::new(provider_version()))
}

/// Build a server and configure it from the config file and flags
pub fn configured_server(ctx: &Context) -> Result<ProviderServer<YoloProvider>> {
    let config = config::provider_config(ctx.config.as_deref(), ctx.notion_secret.as_deref())?;
    let server = server();

    let diags = server.configure(config);
    ui::diagnostics(&diags, ctx.quiet);
    if diags.has_error() {
        bail!("Provider configuration failed");
    }
    Ok(server)
}

/// Accept both `notion_page` and `yoloexp_notion_page`
pub fn qualify(type_name: &str) -> String {
    let prefix = format!("{PROVIDER_TYPE_NAME}_");
    if type_name.starts_with(&prefix) {
        type_name.to_string()
    } else {
        format!("{prefix}{type_name}")
    }
}

/// Read JSON from a file, or from stdin when `source` is `-`
pub fn read_json(source: &str) -> Result<Value> {
    let content = if source == "-" {
        io::read_to_string(io::stdin()).context("Could not read stdin")?
    } else {
        fs::read_to_string(source).with_context(|| format!("Could not read {source}"))?
    };
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {source}"))
}

/// Print a response: state on stdout, diagnostics on stderr
pub fn emit(ctx: &Context, response: &Response) -> Result<()> {
    ui::diagnostics(&response.diagnostics, ctx.quiet);

    let errors = response.diagnostics.errors().count();
    if errors > 0 {
        bail!("Operation failed with {errors} error(s)");
    }

    match &response.state {
        Some(state) => println!("{}", serde_json::to_string_pretty(state)?),
        None => {
            if !ctx.quiet {
                ui::success("Removed from state");
            }
        }
    }
    Ok(())
}
