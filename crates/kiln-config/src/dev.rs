//! Watch-mode configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevConfig {
    /// Quiet period before a burst of file events is recompiled.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Path fragments whose changes are never reported.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ignore: default_ignore(),
        }
    }
}

impl DevConfig {
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }

    /// Whether a changed path matches one of the ignore fragments.
    pub fn is_ignored(&self, path: &std::path::Path) -> bool {
        let path = path.to_string_lossy();
        self.ignore.iter().any(|fragment| path.contains(fragment.as_str()))
    }
}

fn default_debounce_ms() -> u64 {
    50
}

fn default_ignore() -> Vec<String> {
    vec![
        "/.git/".to_string(),
        "/node_modules/".to_string(),
        "/.kiln/".to_string(),
    ]
}
