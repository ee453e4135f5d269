use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "itemctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative management of Zabbix HTTP agent items", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $ITEMCTL_CONFIG_DIR/config.toml)
    #[arg(short, long, global = true, env = "ITEMCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file (default: $ITEMCTL_STATE_DIR/state.toml)
    #[arg(long, global = true, env = "ITEMCTL_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Create, update and delete items to match the configuration
    Apply(ApplyArgs),

    /// Re-read every tracked item and update the state file
    Refresh,

    /// Show the server-side configuration of a tracked item
    Show {
        /// Address, e.g. item_http.web_health
        address: String,
    },

    /// Start tracking an existing item
    Import {
        /// Address to record it under, e.g. item_http.web_health
        address: String,
        /// Item identifier on the server
        itemid: String,
    },

    /// Delete tracked items
    Destroy(DestroyArgs),

    /// Print the item_http field reference
    Schema {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the config file without contacting the server
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Limit to a resource type or address (e.g. item_http.web_health)
    pub target: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Limit to a resource type or address (e.g. item_http.web_health)
    pub target: Option<String>,

    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel API requests
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..=64))]
    pub jobs: u16,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Limit to a resource type or address (e.g. item_http.web_health)
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::parse_from(["itemctl", "-vv", "apply", "item_http.web", "--yes", "-j", "8"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.target.as_deref(), Some("item_http.web"));
                assert!(args.yes);
                assert!(!args.dry_run);
                assert_eq!(args.jobs, 8);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::parse_from(["itemctl", "import", "item_http.web", "28510"]);
        assert!(matches!(
            cli.command,
            Command::Import { ref address, ref itemid } if address == "item_http.web" && itemid == "28510"
        ));
    }

    #[test]
    fn test_jobs_range() {
        assert!(Cli::try_parse_from(["itemctl", "apply", "--jobs", "0"]).is_err());
    }
}
