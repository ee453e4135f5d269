mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod resource;
mod state;
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
    /// `--config` override
    pub config_path: Option<PathBuf>,
    /// `--state` override
    pub state_path: Option<PathBuf>,
}

fn main() -> Result<()> {
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
        config_path: cli.config,
        state_path: cli.state,
    };

    match cli.command {
        Command::Plan(args) => commands::declarative::plan(&ctx, args.target.as_deref()),
        Command::Apply(args) => commands::declarative::apply(
            &ctx,
            args.target.as_deref(),
            args.dry_run,
            args.yes,
            args.jobs as usize,
        ),
        Command::Refresh => commands::declarative::refresh(&ctx),
        Command::Show { address } => commands::crud::show(&ctx, &address),
        Command::Import { address, itemid } => commands::crud::import(&ctx, &address, &itemid),
        Command::Destroy(args) => {
            commands::declarative::destroy(&ctx, args.target.as_deref(), args.yes)
        }
        Command::Schema { json } => commands::schema::schema(json),
        Command::Validate => commands::schema::validate(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "itemctl", &mut io::stdout());
            Ok(())
        }
    }
}
