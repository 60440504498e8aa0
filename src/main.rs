mod cli;
mod commands;
mod config;
mod data_source;
mod models;
mod provider;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub notion_secret: Option<String>,
    pub config: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        ui::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        notion_secret: cli.notion_secret,
        config: cli.config,
    };
    log::debug!("Running with verbosity {}", ctx.verbose);

    match cli.command {
        Command::Schema => commands::schema::run(),
        Command::Data { data_source, id } => commands::data::run(&ctx, &data_source, &id),
        Command::Resource {
            action,
            resource,
            state,
            prior,
        } => commands::resource::run(&ctx, action, &resource, &state, prior.as_deref()),
        Command::Batch { file, jobs } => commands::batch::run(&ctx, &file, jobs),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "terraform-provider-yoloexp", &mut io::stdout());
            Ok(())
        }
    }
}
