//! `kiln analyze`: print the bundle partition as JSON.

use kiln_bundler::{AnalysisReport, BundleAnalyzer};

use crate::cli::{AnalyzeArgs, GlobalArgs};
use crate::error::{CliError, Result};
use crate::project::{Project, load_config};
use crate::{logger, ui};

pub async fn execute(args: AnalyzeArgs, global: GlobalArgs) -> Result<AnalysisReport> {
    let config = load_config(&args.project)?;
    logger::init_logger(
        global.verbose,
        global.quiet,
        global.no_color,
        config.settings.log_level.as_deref(),
    );

    let project = Project::open(config)?;
    let report = project.compile().await;
    if report.error_count() > 0 {
        return Err(CliError::CompileFailed {
            count: report.error_count(),
        });
    }

    let analysis = BundleAnalyzer::new(project.compiler().graph()).analyze(project.entries());
    let report = analysis.report();
    let json = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            let path = project.config().resolve_path(path);
            tokio::fs::write(&path, json.as_bytes()).await?;
            if !global.quiet {
                ui::success(&format!("wrote analysis to {}", path.display()));
            }
        }
        None => println!("{json}"),
    }
    Ok(report)
}
