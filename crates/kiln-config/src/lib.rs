//! Configuration for kiln builds.
//!
//! A [`KilnConfig`] is layered from built-in defaults, an optional
//! `kiln.toml` in the project root, `KILN_*` environment variables and
//! finally command-line overrides. See [`ConfigDiscovery`].

pub mod config;
pub mod dev;
pub mod discovery;
pub mod error;
pub mod settings;
pub mod validation;

pub use config::*;
pub use dev::*;
pub use error::*;
pub use settings::*;

pub use discovery::{CONFIG_FILE, ConfigDiscovery, ConfigOverrides, ENV_PREFIX, discover};
pub use validation::{ConfigValidator, FsValidator, SchemaValidator};
