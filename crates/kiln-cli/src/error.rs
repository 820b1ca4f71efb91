//! Error handling for the kiln CLI.
//!
//! Library errors convert into [`CliError`] via `#[from]`; `main` turns the
//! final error into a [`miette::Report`] with a hint where one helps.

use std::path::PathBuf;

use kiln_bundler::BundleError;
use kiln_compiler::{FatalBuildError, ResolveError, StoreError};
use kiln_config::ConfigError;
use miette::Report;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build failed: {0}")]
    Build(#[from] FatalBuildError),

    #[error("Bundle failed: {0}")]
    Bundle(#[from] BundleError),

    #[error("Cannot resolve entry: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Artifact cache error: {0}")]
    Store(#[from] StoreError),

    #[error("{count} module(s) failed to compile")]
    CompileFailed { count: usize },

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Config(ConfigError::NoEntries) => {
                Some("Add [[entries]] to kiln.toml or pass --entry name=path")
            }
            Self::Config(ConfigError::NotFound(_)) => {
                Some("Create kiln.toml in the project root or pass --config <file>")
            }
            Self::Config(ConfigError::Extract(_)) => Some("Check kiln.toml syntax and field types"),
            Self::Config(ConfigError::EntryNotFound(_)) => {
                Some("Entry paths are relative to the project root")
            }
            Self::Build(FatalBuildError::MissingDependency(_))
            | Self::Bundle(BundleError::Fatal(FatalBuildError::MissingDependency(_))) => {
                Some("A module imports a file that no longer exists")
            }
            Self::Build(FatalBuildError::BundleWrite { .. })
            | Self::Bundle(BundleError::Fatal(FatalBuildError::BundleWrite { .. })) => {
                Some("Check output directory permissions or pass a different --out-dir")
            }
            Self::Store(_) | Self::Build(FatalBuildError::Store(_)) => {
                Some("Delete the cache directory (.kiln/cache by default) to start over")
            }
            Self::CompileFailed { .. } => Some("Fix the errors listed above and run again"),
            Self::Resolve(_) => Some("Bare specifiers need an import_map alias in kiln.toml"),
            _ => None,
        }
    }
}

/// Convert a CLI error into a miette report.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err.hint() {
        Some(hint) => miette::miette!(help = hint, "{}", err),
        None => miette::miette!("{}", err),
    }
}
