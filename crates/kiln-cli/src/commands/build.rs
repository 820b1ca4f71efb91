//! `kiln build`: compile every entry, then write production bundles.

use std::time::Instant;

use kiln_bundler::BundleOutput;

use crate::cli::{BuildArgs, GlobalArgs};
use crate::error::{CliError, Result};
use crate::project::{Project, load_config};
use crate::{logger, ui};

pub async fn execute(args: BuildArgs, global: GlobalArgs) -> Result<BundleOutput> {
    let config = load_config(&args.project)?;
    logger::init_logger(
        global.verbose,
        global.quiet,
        global.no_color,
        config.settings.log_level.as_deref(),
    );

    let started = Instant::now();
    let project = Project::open(config)?;
    let out_dir = match &args.out_dir {
        Some(dir) => project.config().resolve_path(dir),
        None => project.out_dir(),
    };

    let report = project.compile().await;
    tracing::info!(
        "compiled {} modules ({} transpiled, {} from cache)",
        report.outcomes.len(),
        report.transpiled,
        report.reused
    );
    if report.error_count() > 0 {
        return Err(CliError::CompileFailed {
            count: report.error_count(),
        });
    }

    if args.clean && out_dir.exists() {
        tracing::debug!("removing {}", out_dir.display());
        tokio::fs::remove_dir_all(&out_dir).await?;
    }

    let output = project.bundler(out_dir.clone()).bundle(project.entries()).await?;
    if !global.quiet {
        ui::print_bundle_summary(&output.manifest, &out_dir, started.elapsed());
    }
    Ok(output)
}
