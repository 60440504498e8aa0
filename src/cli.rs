use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "terraform-provider-yoloexp")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Notion provider for declarative infrastructure tools", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Notion integration secret (overrides the configuration file)
    #[arg(long, global = true)]
    pub notion_secret: Option<String>,

    /// Provider configuration file (TOML or JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the provider, resource and data source schemas
    Schema,

    /// Read a data source
    Data {
        /// Data source type (e.g. notion_page or yoloexp_notion_page)
        data_source: String,

        /// Object id to look up
        #[arg(long)]
        id: String,
    },

    /// Run one lifecycle operation on a managed resource
    Resource {
        #[arg(value_enum)]
        action: ResourceAction,

        /// Resource type (e.g. notion_database)
        resource: String,

        /// Planned or current state as JSON, `-` for stdin
        #[arg(long, default_value = "-")]
        state: String,

        /// Prior state for update, defaults to --state
        #[arg(long)]
        prior: Option<String>,
    },

    /// Run a JSON list of calls concurrently
    Batch {
        /// File holding the calls, `-` for stdin
        file: String,

        /// Number of worker threads
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceAction {
    Create,
    Read,
    Update,
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resource_update() {
        let cli = Cli::try_parse_from([
            "terraform-provider-yoloexp",
            "-vv",
            "resource",
            "update",
            "notion_database",
            "--state",
            "plan.json",
            "--prior",
            "state.json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Resource {
                action,
                resource,
                state,
                prior,
            } => {
                assert_eq!(action, ResourceAction::Update);
                assert_eq!(resource, "notion_database");
                assert_eq!(state, "plan.json");
                assert_eq!(prior.as_deref(), Some("state.json"));
            }
            _ => panic!("expected resource command"),
        }
    }

    #[test]
    fn test_parse_batch_defaults() {
        let cli = Cli::try_parse_from(["terraform-provider-yoloexp", "batch", "calls.json"]).unwrap();
        match cli.command {
            Command::Batch { file, jobs } => {
                assert_eq!(file, "calls.json");
                assert_eq!(jobs, 4);
            }
            _ => panic!("expected batch command"),
        }
    }
}
