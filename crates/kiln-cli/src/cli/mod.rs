//! Command-line interface definition.
//!
//! - `kiln build` - compile every entry and write production bundles
//! - `kiln dev` - compile, then recompile incrementally on file changes
//! - `kiln analyze` - print the shared/entry bundle partition as JSON

mod commands;

use clap::Parser;

pub use commands::{AnalyzeArgs, BuildArgs, Command, DevArgs, ProjectArgs, parse_entry};

/// Kiln - incremental, content-addressed ES module builds
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Incremental, content-addressed ES module builds",
    long_about = "Kiln compiles ES modules into content-addressed artifacts, keeps them\n\
                  current as files change and partitions them into shared and per-entry\n\
                  bundles for production."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalArgs {
    pub verbose: bool,
    pub quiet: bool,
    pub no_color: bool,
}

impl Cli {
    pub fn global(&self) -> GlobalArgs {
        GlobalArgs {
            verbose: self.verbose,
            quiet: self.quiet,
            no_color: self.no_color,
        }
    }
}
