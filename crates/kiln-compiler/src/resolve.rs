//! Import resolution.
//!
//! Relative (`./x`, `../x`), rooted (`/x`) and URL imports are joined
//! against the importer first. The result (or the bare import string) is
//! then offered to an ordered list of [`ResolveListener`]s; the first whose
//! pattern matches decides.

use std::sync::Arc;

use kiln_graph::Specifier;
use regex::Regex;

use crate::error::ResolveError;

/// What a listener decided for a matching specifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveOutcome {
    /// Rewritten specifier; `None` keeps the input.
    pub specifier: Option<String>,
    /// Do not compile; keep the import pointing at the specifier itself.
    pub external: bool,
    /// Opaque listener data. Logged at debug level when present; it never
    /// influences resolution.
    pub data: Option<serde_json::Value>,
}

/// One entry in the ordered resolve chain.
pub trait ResolveListener: Send + Sync {
    fn pattern(&self) -> &Regex;

    fn resolve(&self, specifier: &str) -> ResolveOutcome;
}

/// Rewrites an import-map key to its target.
///
/// Keys ending in `/` map every import under that prefix
/// (`"@/": "/src/"` turns `@/lib.ts` into `/src/lib.ts`); other keys match
/// exactly.
#[derive(Debug, Clone)]
pub struct AliasListener {
    pattern: Regex,
    from: String,
    to: String,
    external: bool,
}

impl AliasListener {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Result<Self, ResolveError> {
        let from = from.into();
        let escaped = regex::escape(&from);
        let pattern = if from.ends_with('/') {
            Regex::new(&format!("^{escaped}"))?
        } else {
            Regex::new(&format!("^{escaped}$"))?
        };
        Ok(Self {
            pattern,
            from,
            to: to.into(),
            external: false,
        })
    }

    /// Mark every specifier this alias produces as external.
    pub fn external(mut self, external: bool) -> Self {
        self.external = external;
        self
    }
}

impl ResolveListener for AliasListener {
    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn resolve(&self, specifier: &str) -> ResolveOutcome {
        let rest = specifier.strip_prefix(self.from.as_str()).unwrap_or_default();
        ResolveOutcome {
            specifier: Some(format!("{}{}", self.to, rest)),
            external: self.external,
            data: None,
        }
    }
}

/// Marks every matching specifier as external.
#[derive(Debug, Clone)]
pub struct ExternalListener {
    pattern: Regex,
}

impl ExternalListener {
    pub fn new(pattern: &str) -> Result<Self, ResolveError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl ResolveListener for ExternalListener {
    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn resolve(&self, _specifier: &str) -> ResolveOutcome {
        ResolveOutcome {
            external: true,
            ..ResolveOutcome::default()
        }
    }
}

/// A fully resolved import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub specifier: Specifier,
    pub external: bool,
}

/// Ordered resolve chain.
#[derive(Clone, Default)]
pub struct Resolver {
    listeners: Vec<Arc<dyn ResolveListener>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the chain from an import map plus external patterns.
    ///
    /// Externals are consulted first. An alias whose target is a remote URL
    /// is external unless the target starts with one of `compile_remote`.
    pub fn from_import_map<'a, I>(
        import_map: I,
        external: &[String],
        compile_remote: &[String],
    ) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut resolver = Self::new();
        for pattern in external {
            resolver.push(ExternalListener::new(pattern)?);
        }
        for (from, to) in import_map {
            let remote = to.starts_with("https://") || to.starts_with("http://");
            let compiled = compile_remote.iter().any(|prefix| to.starts_with(prefix.as_str()));
            resolver.push(AliasListener::new(from, to)?.external(remote && !compiled));
        }
        Ok(resolver)
    }

    pub fn with_listener(mut self, listener: impl ResolveListener + 'static) -> Self {
        self.push(listener);
        self
    }

    pub fn push(&mut self, listener: impl ResolveListener + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Resolve `import` as written inside `importer` (or as an entry when
    /// `importer` is `None`).
    pub fn resolve(
        &self,
        importer: Option<&Specifier>,
        import: &str,
    ) -> Result<Resolved, ResolveError> {
        let candidate = match importer.and_then(|i| i.join(import)) {
            Some(joined) => joined.to_string(),
            None => import.to_string(),
        };

        for listener in &self.listeners {
            if !listener.pattern().is_match(&candidate) {
                continue;
            }

            let outcome = listener.resolve(&candidate);
            if let Some(data) = &outcome.data {
                tracing::debug!(
                    "{} matched /{}/ with data {}",
                    candidate,
                    listener.pattern().as_str(),
                    data
                );
            }
            let target = outcome.specifier.unwrap_or_else(|| candidate.clone());
            let specifier = Specifier::new(&target).map_err(|_| ResolveError::InvalidTarget {
                specifier: import.to_string(),
                target: target.clone(),
            })?;
            return Ok(Resolved {
                specifier,
                external: outcome.external,
            });
        }

        Specifier::new(&candidate)
            .map(|specifier| Resolved {
                specifier,
                external: false,
            })
            .map_err(|_| ResolveError::Unresolved {
                specifier: import.to_string(),
                importer: importer.cloned(),
            })
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let patterns: Vec<&str> = self.listeners.iter().map(|l| l.pattern().as_str()).collect();
        f.debug_struct("Resolver").field("listeners", &patterns).finish()
    }
}
