//! Command implementations.

pub mod analyze;
pub mod build;
pub mod dev;

pub use analyze::execute as analyze_execute;
pub use build::execute as build_execute;
pub use dev::execute as dev_execute;
