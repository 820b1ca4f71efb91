//! Regex-based import discovery.
//!
//! Script sources pass through unchanged; only their import strings are
//! located. JSON and CSS are wrapped into `export default` modules.

use std::ops::Range;
use std::sync::LazyLock;

use async_trait::async_trait;
use kiln_graph::{SourceKind, Specifier};
use regex::Regex;

use super::{DiscoveredImport, TranspileOutput, Transpiler};
use crate::error::{SourceLocation, TranspileError};

/// `import x from "y"`, `import {a, b} from "y"`, `import "y"`, `import type T from "y"`
static STATIC_IMPORT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+(type\s+)?(?:([\w$*{}\s,]+?)\s*from\s*)?["']([^"'\n]+)["']"#).ok()
});

/// `export * from "y"`, `export {a} from "y"`, `export * as ns from "y"`
static EXPORT_FROM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"\bexport\s+(type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*["']([^"'\n]+)["']"#).ok()
});

/// `import("y")`
static DYNAMIC_IMPORT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s*\(\s*["']([^"'\n]+)["']\s*\)"#).ok()
});

/// Default transpiler: locates imports without transforming syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportScanner;

impl ImportScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan script source for imports, sorted by position.
    pub fn scan(&self, code: &str) -> (Vec<DiscoveredImport>, bool) {
        let mut imports = Vec::new();
        let mut side_effects = false;

        let statics = STATIC_IMPORT.iter().flat_map(|re| re.captures_iter(code));
        let reexports = EXPORT_FROM.iter().flat_map(|re| re.captures_iter(code));
        let dynamics = DYNAMIC_IMPORT.iter().flat_map(|re| re.captures_iter(code));

        for caps in statics {
            if caps.get(1).is_some() {
                continue;
            }
            let Some(path) = caps.get(3) else { continue };
            if caps.get(2).is_none() {
                side_effects = true;
            }
            imports.push(DiscoveredImport::new(path.as_str(), path.range()));
        }

        for caps in reexports {
            if caps.get(1).is_some() {
                continue;
            }
            if let Some(path) = caps.get(2) {
                imports.push(DiscoveredImport::new(path.as_str(), path.range()));
            }
        }

        for caps in dynamics {
            if let Some(path) = caps.get(1) {
                imports.push(DiscoveredImport::dynamic(path.as_str(), path.range()));
            }
        }

        imports.sort_by_key(|import| import.range.as_ref().map_or(0, |r| r.start));
        imports.dedup_by_key(|import| import.range.as_ref().map(Range::clone));
        (imports, side_effects)
    }
}

#[async_trait]
impl Transpiler for ImportScanner {
    async fn transpile(
        &self,
        _specifier: &Specifier,
        source: &str,
        kind: &SourceKind,
    ) -> Result<TranspileOutput, TranspileError> {
        match kind {
            SourceKind::JavaScript | SourceKind::TypeScript | SourceKind::Jsx | SourceKind::Tsx => {
                let (imports, side_effects) = self.scan(source);
                Ok(TranspileOutput {
                    code: source.to_string(),
                    imports,
                    side_effects,
                })
            }
            SourceKind::Json => {
                serde_json::from_str::<serde_json::Value>(source).map_err(|e| {
                    TranspileError::Failed {
                        message: format!("invalid JSON: {e}"),
                        location: Some(SourceLocation {
                            line: e.line(),
                            column: e.column(),
                        }),
                    }
                })?;
                Ok(TranspileOutput {
                    code: format!("export default {};\n", source.trim()),
                    imports: Vec::new(),
                    side_effects: false,
                })
            }
            SourceKind::Css => {
                let literal = serde_json::to_string(source).map_err(|e| TranspileError::Failed {
                    message: e.to_string(),
                    location: None,
                })?;
                Ok(TranspileOutput {
                    code: format!("const css = {literal};\nexport default css;\n"),
                    imports: Vec::new(),
                    side_effects: true,
                })
            }
            SourceKind::Other(_) => Err(TranspileError::UnsupportedSyntax { kind: kind.clone() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(imports: &[DiscoveredImport]) -> Vec<(&str, bool)> {
        imports
            .iter()
            .map(|i| (i.specifier.as_str(), i.is_dynamic))
            .collect()
    }

    #[test]
    fn finds_static_dynamic_and_reexports_in_order() {
        let code = r#"
import React from "react";
import { a, b as c } from './lib.ts';
import * as ns from "../ns.ts";
import "./side-effect.css";
export * from "./re.ts";
export { x } from "./x.ts";
const lazy = () => import("./lazy.tsx");
"#;
        let (imports, side_effects) = ImportScanner::new().scan(code);
        assert_eq!(
            specs(&imports),
            [
                ("react", false),
                ("./lib.ts", false),
                ("../ns.ts", false),
                ("./side-effect.css", false),
                ("./re.ts", false),
                ("./x.ts", false),
                ("./lazy.tsx", true),
            ]
        );
        assert!(side_effects);
    }

    #[test]
    fn ranges_cover_string_contents() {
        let code = "import { a } from \"./lib.ts\";";
        let (imports, _) = ImportScanner::new().scan(code);
        let range = imports[0].range.clone().unwrap();
        assert_eq!(&code[range], "./lib.ts");
    }

    #[test]
    fn multiline_named_imports() {
        let code = "import {\n  a,\n  b,\n} from \"./lib.ts\";\n";
        let (imports, side_effects) = ImportScanner::new().scan(code);
        assert_eq!(specs(&imports), [("./lib.ts", false)]);
        assert!(!side_effects);
    }

    #[test]
    fn type_only_imports_are_erased() {
        let code = "import type { T } from './types.ts';\nexport type { U } from './u.ts';\n";
        let (imports, _) = ImportScanner::new().scan(code);
        assert!(imports.is_empty());
    }

    #[tokio::test]
    async fn json_is_wrapped_and_validated() {
        let spec = Specifier::new("/data.json").unwrap();
        let out = ImportScanner::new()
            .transpile(&spec, "{\"a\": 1}", &SourceKind::Json)
            .await
            .unwrap();
        assert_eq!(out.code, "export default {\"a\": 1};\n");

        let err = ImportScanner::new()
            .transpile(&spec, "{\"a\": }", &SourceKind::Json)
            .await
            .unwrap_err();
        assert!(matches!(err, TranspileError::Failed { location: Some(_), .. }));
    }

    #[tokio::test]
    async fn css_becomes_default_export() {
        let spec = Specifier::new("/style.css").unwrap();
        let out = ImportScanner::new()
            .transpile(&spec, "a { color: \"red\" }", &SourceKind::Css)
            .await
            .unwrap();
        assert!(out.code.contains("export default css"));
        assert!(out.code.contains("\\\"red\\\""));
    }

    #[tokio::test]
    async fn unknown_kinds_are_unsupported() {
        let spec = Specifier::new("/logo.svg").unwrap();
        let err = ImportScanner::new()
            .transpile(&spec, "<svg/>", &SourceKind::Other("svg".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, TranspileError::UnsupportedSyntax { .. }));
    }
}
