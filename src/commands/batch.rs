//! Concurrent call execution
//!
//! A batch file is a JSON array of calls, e.g.
//!
//! ```json
//! [
//!   { "op": "read_data_source", "data_source": "notion_page", "config": { "id": "..." } },
//!   { "op": "create", "resource": "notion_database", "planned": { "parent_id": "..." } }
//! ]
//! ```

use crate::Context;
use crate::ui;
use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::Call;

/// Run every call in `file` on `jobs` threads
pub fn run(ctx: &Context, file: &str, jobs: usize) -> Result<()> {
    let calls: Vec<Call> = serde_json::from_value(super::read_json(file)?)
        .with_context(|| format!("Invalid batch file {file}"))?;
    let calls: Vec<Call> = calls.into_iter().map(qualify_call).collect();

    let server = super::configured_server(ctx)?;
    if !ctx.quiet {
        ui::info(&format!("Running {} call(s) on {} thread(s)", calls.len(), jobs.max(1)));
    }

    let responses = server.run_batch(&calls, jobs)?;

    let mut failed = 0;
    for (i, (call, response)) in calls.iter().zip(&responses).enumerate() {
        if !response.is_success() {
            failed += 1;
        }
        if response.diagnostics.is_empty() || (ctx.quiet && response.is_success()) {
            continue;
        }
        ui::dim(&format!("[{}] {}", i + 1, call.target().bold()));
        ui::diagnostics(&response.diagnostics, ctx.quiet);
    }

    println!("{}", serde_json::to_string_pretty(&responses)?);

    if failed > 0 {
        bail!("{failed} of {} call(s) failed", calls.len());
    }
    if !ctx.quiet {
        ui::success(&format!("{} call(s) succeeded", calls.len()));
    }
    Ok(())
}

fn qualify_call(call: Call) -> Call {
    match call {
        Call::Create { resource, planned } => Call::Create {
            resource: super::qualify(&resource),
            planned,
        },
        Call::Read { resource, state } => Call::Read {
            resource: super::qualify(&resource),
            state,
        },
        Call::Update {
            resource,
            prior,
            planned,
        } => Call::Update {
            resource: super::qualify(&resource),
            prior,
            planned,
        },
        Call::Delete { resource, state } => Call::Delete {
            resource: super::qualify(&resource),
            state,
        },
        Call::ReadDataSource { data_source, config } => Call::ReadDataSource {
            data_source: super::qualify(&data_source),
            config,
        },
    }
}
