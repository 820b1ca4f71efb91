//! `kiln` binary entry point.

use clap::Parser;
use kiln_cli::{cli, commands, error, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let global = args.global();
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args, global)
            .await
            .map(|_| ()),
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args, global).await,
        cli::Command::Analyze(analyze_args) => commands::analyze_execute(analyze_args, global)
            .await
            .map(|_| ()),
    };

    result.map_err(error::cli_error_to_miette)
}
