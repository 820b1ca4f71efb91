//! The kiln configuration document.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use kiln_compiler::BuildManifest;
use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::dev::DevConfig;
use crate::settings::GlobalSettings;

/// Full configuration for one project.
///
/// Relative paths are taken against `root`; after loading through
/// [`crate::ConfigDiscovery`] the root itself is absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    pub root: PathBuf,

    /// Named bundle entries (`vendor`, `common`, one per page, ...).
    pub entries: Vec<EntryConfig>,

    pub out_dir: PathBuf,

    pub cache_dir: PathBuf,

    /// Bare-specifier aliases. A target that is a URL makes the import
    /// external unless it starts with one of `compile_remote`.
    pub import_map: IndexMap<String, String>,

    /// URL prefixes whose modules are compiled rather than left external.
    pub compile_remote: Vec<String>,

    /// Regex patterns of specifiers that are never compiled.
    pub external: Vec<String>,

    pub dev: DevConfig,

    pub settings: GlobalSettings,
}

/// One named bundle entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    pub name: String,

    /// Module paths (relative to the root), URLs or import-map aliases.
    pub modules: Vec<String>,

    #[serde(default)]
    pub preload: bool,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entries: Vec::new(),
            out_dir: PathBuf::from("dist"),
            cache_dir: PathBuf::from(".kiln/cache"),
            import_map: IndexMap::new(),
            compile_remote: Vec::new(),
            external: Vec::new(),
            dev: DevConfig::default(),
            settings: GlobalSettings::default(),
        }
    }
}

impl EntryConfig {
    pub fn new(name: impl Into<String>, modules: Vec<String>) -> Self {
        Self {
            name: name.into(),
            modules,
            preload: false,
        }
    }
}

impl KilnConfig {
    /// `path` against the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.root.join(path).clean()
        }
    }

    pub fn out_dir_path(&self) -> PathBuf {
        self.resolve_path(&self.out_dir)
    }

    pub fn cache_dir_path(&self) -> PathBuf {
        self.resolve_path(&self.cache_dir)
    }

    /// Turn an entry module as written in the config into something the
    /// resolver accepts: URLs and import-map aliases pass through, paths
    /// become absolute.
    pub fn entry_specifier(&self, module: &str) -> String {
        let is_url = module.starts_with("https://") || module.starts_with("http://");
        if is_url || self.import_map.contains_key(module) {
            return module.to_string();
        }
        self.resolve_path(Path::new(module))
            .to_string_lossy()
            .into_owned()
    }

    pub fn entry(&self, name: &str) -> Option<&EntryConfig> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Digest of the import map. Alias order is significant.
    pub fn import_map_digest(&self) -> String {
        BuildManifest::digest(
            self.import_map
                .iter()
                .flat_map(|(from, to)| [from.as_str(), to.as_str()]),
        )
    }

    /// Digest of everything that changes how specifiers resolve besides
    /// the import map: the external patterns and the compiled remote
    /// prefixes.
    pub fn plugin_list_digest(&self) -> String {
        let externals = self.external.iter().map(|p| ["external", p.as_str()]);
        let remotes = self.compile_remote.iter().map(|p| ["compile_remote", p.as_str()]);
        BuildManifest::digest(externals.chain(remotes).flatten())
    }

    /// Build manifest for this configuration.
    pub fn build_manifest(&self) -> BuildManifest {
        BuildManifest::new(self.import_map_digest(), self.plugin_list_digest())
    }
}
