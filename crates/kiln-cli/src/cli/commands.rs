use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use kiln_config::{ConfigOverrides, EntryConfig};

/// Available kiln subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile every entry and write production bundles
    ///
    /// Fails when any module reachable from an entry does not compile or
    /// imports something that does not exist.
    Build(BuildArgs),

    /// Compile, then watch the project and recompile on change
    ///
    /// Only changed modules are transpiled again; importers are repaired by
    /// patching hash tokens in their compiled output.
    Dev(DevArgs),

    /// Print the bundle partition (shared graph, entry trees, async entries)
    /// as JSON
    Analyze(AnalyzeArgs),
}

/// Where the project is and which entries to use.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project root
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Config file (defaults to <root>/kiln.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Entry override, `name=path[,path...]` or just `path`
    ///
    /// Replaces the entries of the config file. Repeat for several entries.
    #[arg(short, long = "entry", value_name = "ENTRY", value_parser = parse_entry)]
    pub entries: Vec<EntryConfig>,
}

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Output directory for bundles
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Remove the output directory before writing
    #[arg(long)]
    pub clean: bool,
}

/// Arguments for the dev command
#[derive(Args, Debug)]
pub struct DevArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Debounce window for file events, in milliseconds
    #[arg(long, value_name = "MS")]
    pub debounce: Option<u64>,
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ProjectArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            entries: self.entries.clone(),
            ..ConfigOverrides::default()
        }
    }
}

/// Parse `name=path[,path...]`; a bare path is named after its file stem.
pub fn parse_entry(value: &str) -> Result<EntryConfig, String> {
    let (name, modules) = match value.split_once('=') {
        Some((name, modules)) => (name.trim().to_string(), modules),
        None => {
            let stem = Path::new(value)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| format!("cannot derive an entry name from '{value}'"))?;
            (stem.to_string(), value)
        }
    };

    let modules: Vec<String> = modules
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    if name.is_empty() || modules.is_empty() {
        return Err(format!("expected name=path[,path...], got '{value}'"));
    }
    Ok(EntryConfig::new(name, modules))
}
