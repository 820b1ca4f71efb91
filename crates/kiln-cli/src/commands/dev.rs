//! `kiln dev`: compile once, then keep the build current as files change.

use std::path::PathBuf;

use kiln_config::CONFIG_FILE;

use crate::cli::{DevArgs, GlobalArgs};
use crate::dev::{self, SessionEnd};
use crate::error::Result;
use crate::project::{Project, load_config};
use crate::{logger, ui};

pub async fn execute(args: DevArgs, global: GlobalArgs) -> Result<()> {
    let config_file = config_file(&args)?;

    loop {
        let mut config = load_config(&args.project)?;
        logger::init_logger(
            global.verbose,
            global.quiet,
            global.no_color,
            config.settings.log_level.as_deref(),
        );
        if let Some(ms) = args.debounce {
            config.dev.debounce_ms = ms;
        }

        let project = Project::open(config)?;
        let report = project.compile().await;
        if report.is_clean() {
            ui::success(&format!(
                "compiled {} modules ({} transpiled, {} from cache)",
                report.outcomes.len(),
                report.transpiled,
                report.reused
            ));
        } else {
            ui::warning(&format!(
                "compiled with {} error(s); watching for fixes",
                report.error_count() + report.missing.len()
            ));
        }

        match dev::watch(&project, config_file.clone()).await? {
            SessionEnd::ConfigChanged => continue,
            SessionEnd::Shutdown => return Ok(()),
        }
    }
}

fn config_file(args: &DevArgs) -> Result<PathBuf> {
    let file = match &args.project.config {
        Some(file) => file.clone(),
        None => args.project.root.join(CONFIG_FILE),
    };
    Ok(std::path::absolute(file)?)
}
