//! A loaded project: configuration plus the compiler wired to it.

use std::path::PathBuf;
use std::sync::Arc;

use kiln_bundler::{Bundler, EntryPoint};
use kiln_compiler::{
    ArtifactStore, BuildManifest, CompileOptions, Compiler, FsLoader, ImportScanner,
    ManifestStatus, PassReport, RedbStore, Resolver,
};
use kiln_config::{ConfigDiscovery, ConfigValidator, FsValidator, KilnConfig};
use kiln_graph::Specifier;

use crate::cli::ProjectArgs;
use crate::error::Result;
use crate::ui;

/// Load, validate (including entry files) and return the configuration.
pub fn load_config(args: &ProjectArgs) -> Result<KilnConfig> {
    let mut discovery = ConfigDiscovery::new(&args.root);
    if let Some(file) = &args.config {
        discovery = discovery.with_file(file);
    }
    let config = discovery.load(&args.overrides())?;
    FsValidator.validate(&config)?;
    Ok(config)
}

/// Compiler, store and entries for one configuration.
pub struct Project {
    config: KilnConfig,
    manifest: BuildManifest,
    store: Arc<RedbStore>,
    compiler: Arc<Compiler>,
    entries: Vec<EntryPoint>,
}

impl Project {
    /// Open the artifact cache, check the build manifest and resolve the
    /// configured entries.
    pub fn open(config: KilnConfig) -> Result<Self> {
        let resolver = Resolver::from_import_map(
            config
                .import_map
                .iter()
                .map(|(from, to)| (from.as_str(), to.as_str())),
            &config.external,
            &config.compile_remote,
        )?;
        let store = Arc::new(RedbStore::open(&config.cache_dir_path())?);
        let manifest = config.build_manifest();

        let compiler = Compiler::new(
            Arc::new(FsLoader::new()),
            Arc::new(ImportScanner::new()),
            store.clone() as Arc<dyn ArtifactStore>,
        )
        .with_resolver(resolver)
        .with_manifest(manifest.clone());

        match compiler.prepare()? {
            ManifestStatus::Mismatch => {
                ui::info("configuration changed since the last build, starting from a clean cache");
            }
            ManifestStatus::Fresh => tracing::debug!("new artifact cache at {}", store.path().display()),
            ManifestStatus::Matches => {}
        }

        let mut entries = Vec::with_capacity(config.entries.len());
        for entry in &config.entries {
            let modules = entry
                .modules
                .iter()
                .map(|module| compiler.resolve_entry(&config.entry_specifier(module)))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let point = EntryPoint::new(entry.name.clone(), modules);
            entries.push(if entry.preload { point.preload() } else { point });
        }

        Ok(Self {
            config,
            manifest,
            store,
            compiler: Arc::new(compiler),
            entries,
        })
    }

    pub fn config(&self) -> &KilnConfig {
        &self.config
    }

    pub fn compiler(&self) -> &Arc<Compiler> {
        &self.compiler
    }

    pub fn entries(&self) -> &[EntryPoint] {
        &self.entries
    }

    pub fn out_dir(&self) -> PathBuf {
        self.config.out_dir_path()
    }

    /// Every entry module, in config order, without duplicates.
    pub fn roots(&self) -> Vec<Specifier> {
        let mut roots: Vec<Specifier> = Vec::new();
        for module in self.entries.iter().flat_map(|entry| &entry.modules) {
            if !roots.contains(module) {
                roots.push(module.clone());
            }
        }
        roots
    }

    /// Compile every entry and report per-module failures.
    pub async fn compile(&self) -> PassReport {
        let report = self
            .compiler
            .compile_all(&self.roots(), CompileOptions::default())
            .await;
        for (specifier, error) in report.errors() {
            ui::error(&format!("{specifier}: {error}"));
        }
        for missing in &report.missing {
            ui::warning(&missing.to_string());
        }
        report
    }

    /// Bundler over the current graph. Chunk names fold in the build
    /// manifest so a config change renames every chunk.
    pub fn bundler(&self, out_dir: PathBuf) -> Bundler {
        let metadata = BuildManifest::digest([
            self.manifest.compiler_version.as_str(),
            self.manifest.import_map_digest.as_str(),
            self.manifest.plugin_list_digest.as_str(),
        ]);
        Bundler::new(
            self.compiler.graph().clone(),
            self.store.clone() as Arc<dyn ArtifactStore>,
            out_dir,
        )
        .with_metadata(metadata)
    }
}
