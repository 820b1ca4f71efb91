//! Layered config loading.
//!
//! Priority, highest last: built-in defaults, `kiln.toml`, `KILN_*`
//! environment variables, command-line overrides. Nested keys use a double
//! underscore in the environment (`KILN_DEV__DEBOUNCE_MS=100`).

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::config::{EntryConfig, KilnConfig};
use crate::error::{ConfigError, Result};
use crate::validation::{ConfigValidator, SchemaValidator};

/// Config file looked up in the project root.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "KILN_";

/// Values set on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryConfig>,
}

/// Finds and loads the configuration for a project root.
///
/// # Example
///
/// ```no_run
/// use kiln_config::{ConfigDiscovery, ConfigOverrides};
///
/// let config = ConfigDiscovery::new(".").load(&ConfigOverrides::default()).unwrap();
/// println!("writing bundles to {}", config.out_dir_path().display());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    root: PathBuf,
    file: Option<PathBuf>,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            file: None,
        }
    }

    /// Use an explicit config file instead of `<root>/kiln.toml`. The file
    /// must exist.
    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The config file that will be read, if any.
    pub fn find(&self) -> Option<PathBuf> {
        if let Some(file) = &self.file {
            return Some(file.clone());
        }
        let path = self.root.join(CONFIG_FILE);
        path.is_file().then_some(path)
    }

    /// The provider stack, before extraction.
    pub fn figment(&self, overrides: &ConfigOverrides) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(KilnConfig::default()));

        if let Some(path) = self.find() {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path));
            }
            tracing::debug!("loading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides)))
    }

    /// Load without validating. The root is made absolute.
    pub fn extract(&self, overrides: &ConfigOverrides) -> Result<KilnConfig> {
        let mut config: KilnConfig = self.figment(overrides)?.extract()?;
        config.root = self.absolute_root(&config.root)?;
        Ok(config)
    }

    /// Load and run schema validation.
    pub fn load(&self, overrides: &ConfigOverrides) -> Result<KilnConfig> {
        let config = self.extract(overrides)?;
        SchemaValidator.validate(&config)?;
        tracing::debug!(
            "loaded config: root {}, {} entries",
            config.root.display(),
            config.entries.len()
        );
        Ok(config)
    }

    /// The configured root, taken against the config file's directory (or
    /// the discovery root when there is no file).
    fn absolute_root(&self, configured: &Path) -> Result<PathBuf> {
        let base = match self.find().as_deref().and_then(Path::parent) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => self.root.clone(),
        };
        let base = if base.is_absolute() {
            base
        } else {
            std::env::current_dir()?.join(base)
        };
        Ok(base.join(configured).clean())
    }
}

/// Load and validate the configuration of the current directory.
pub fn discover() -> Result<KilnConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(root).load(&ConfigOverrides::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_returns_none_without_a_file() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigDiscovery::new(dir.path()).find().is_none());
    }

    #[test]
    fn find_discovers_kiln_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "out_dir = \"build\"\n").unwrap();
        assert_eq!(ConfigDiscovery::new(dir.path()).find().unwrap(), path);
    }

    #[test]
    fn explicit_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ConfigDiscovery::new(dir.path())
            .with_file(dir.path().join("other.toml"))
            .extract(&ConfigOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn root_is_relative_to_the_config_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("site")).unwrap();
        let file = dir.path().join("site").join("kiln.toml");
        fs::write(&file, "root = \"web\"\n").unwrap();

        let config = ConfigDiscovery::new(dir.path())
            .with_file(&file)
            .extract(&ConfigOverrides::default())
            .unwrap();
        assert_eq!(config.root, dir.path().join("site").join("web"));
    }
}
