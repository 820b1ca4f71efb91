//! Transpiler seam.
//!
//! The compiler never parses syntax. It hands source text to a
//! [`Transpiler`] and consumes the structured result: output code plus the
//! imports found in it, each with the byte range of its string literal so
//! the import path can be rewritten and its hash slot recorded.

mod scanner;

use std::ops::Range;

use async_trait::async_trait;
use kiln_graph::{SourceKind, Specifier};

use crate::error::TranspileError;

pub use scanner::ImportScanner;

/// An import found in transpiled code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredImport {
    /// The import string as written.
    pub specifier: String,
    pub is_dynamic: bool,
    /// Byte range of the string literal's contents within the output code.
    /// Imports without a range are recorded but never rewritten.
    pub range: Option<Range<usize>>,
}

impl DiscoveredImport {
    pub fn new(specifier: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            specifier: specifier.into(),
            is_dynamic: false,
            range: Some(range),
        }
    }

    pub fn dynamic(specifier: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            is_dynamic: true,
            ..Self::new(specifier, range)
        }
    }
}

/// Result of one transpile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOutput {
    pub code: String,
    /// Imports in source order.
    pub imports: Vec<DiscoveredImport>,
    /// The module runs code on import beyond declarations (carried into
    /// `ModuleFlags::has_side_effect_hooks`).
    pub side_effects: bool,
}

#[async_trait]
pub trait Transpiler: Send + Sync {
    async fn transpile(
        &self,
        specifier: &Specifier,
        source: &str,
        kind: &SourceKind,
    ) -> Result<TranspileOutput, TranspileError>;
}
