//! Global settings shared by every command.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// `trace`, `debug`, `info`, `warn` or `error`. `RUST_LOG` wins when set.
    #[serde(default)]
    pub log_level: Option<String>,
}
