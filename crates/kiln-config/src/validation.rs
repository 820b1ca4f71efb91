//! Config validation.
//!
//! [`SchemaValidator`] checks the document alone; [`FsValidator`] also
//! checks that local entry modules exist.

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;

use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};

/// Chunk name reserved for modules shared between entries.
const SHARED_CHUNK: &str = "shared";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub trait ConfigValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()>;
}

/// Checks that need no filesystem access.
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        if config.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }

        let mut names = HashSet::new();
        for entry in &config.entries {
            validate_entry_name(&entry.name)?;
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::invalid(
                    "entries",
                    format!("entry name '{}' is used more than once", entry.name),
                ));
            }
            if entry.modules.iter().all(|m| m.trim().is_empty()) {
                return Err(ConfigError::invalid(
                    "entries",
                    format!("entry '{}' has no modules", entry.name),
                ));
            }
        }

        for pattern in &config.external {
            if pattern.trim().is_empty() {
                return Err(ConfigError::invalid("external", "patterns cannot be empty"));
            }
            Regex::new(pattern).map_err(|e| ConfigError::invalid("external", e.to_string()))?;
        }

        for (from, to) in &config.import_map {
            if from.trim().is_empty() || to.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "import_map",
                    "aliases and targets cannot be empty",
                ));
            }
        }

        if let Some(level) = &config.settings.log_level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::invalid(
                    "settings.log_level",
                    format!("'{}' is not one of {}", level, LOG_LEVELS.join(", ")),
                ));
            }
        }

        if config.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("out_dir", "cannot be empty"));
        }
        if config.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("cache_dir", "cannot be empty"));
        }

        Ok(())
    }
}

/// Entry names become chunk file names.
fn validate_entry_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ConfigError::invalid(
            "entries",
            format!("entry name '{name}' may only contain letters, digits, '-' and '_'"),
        ));
    }
    if name == SHARED_CHUNK {
        return Err(ConfigError::invalid(
            "entries",
            format!("entry name '{SHARED_CHUNK}' is reserved for the shared chunk"),
        ));
    }
    Ok(())
}

/// Schema checks plus the existence of every local entry module.
pub struct FsValidator;

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        for module in config.entries.iter().flat_map(|entry| &entry.modules) {
            let specifier = config.entry_specifier(module);
            if !specifier.starts_with('/') {
                continue;
            }
            let path = Path::new(&specifier);
            if !path.is_file() {
                return Err(ConfigError::EntryNotFound(path.to_path_buf()));
            }
        }
        Ok(())
    }
}
