//! Kiln CLI.
//!
//! - [`cli`] - clap definitions
//! - [`commands`] - `build`, `dev` and `analyze`
//! - [`project`] - configuration wired to a compiler and artifact cache
//! - [`dev`] - file watching for `kiln dev`
//! - [`error`] - [`CliError`] and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines and summaries on stderr

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod project;
pub mod ui;

pub use error::{CliError, Result};
