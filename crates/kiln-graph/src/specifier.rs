use std::fmt;
use std::path::Path;
use std::sync::Arc;

use path_clean::PathClean;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

const REMOTE_SCHEMES: [&str; 2] = ["https://", "http://"];

/// Stable identity of a module: an absolute path-like string, or an absolute
/// URL for remote modules. Other schemes (`node:fs`, `npm:react`) are kept
/// verbatim; they can only ever be external.
///
/// Backed by `Arc<str>` so cloning a specifier into edge lists, tracing sets
/// and reverse-edge maps stays cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Specifier(Arc<str>);

impl Specifier {
    /// Create a specifier from an absolute path or URL.
    ///
    /// Local paths are cleaned (`/a/./b/../c` becomes `/a/c`) so that two
    /// imports of the same file always land on the same graph key.
    pub fn new(value: impl AsRef<str>) -> Result<Self, Error> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(Error::InvalidSpecifier("empty specifier".to_string()));
        }

        if is_remote(value) {
            return Ok(Self(Arc::from(clean_url(value))));
        }

        if has_scheme(value) {
            return Ok(Self(Arc::from(value)));
        }

        if !value.starts_with('/') {
            return Err(Error::InvalidSpecifier(format!(
                "'{value}' is neither an absolute path nor a URL"
            )));
        }

        Ok(Self(Arc::from(clean_path(value))))
    }

    /// Create a specifier from a filesystem path.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        Self::new(path.to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this specifier points at a remote (http/https) module.
    pub fn is_remote(&self) -> bool {
        is_remote(&self.0)
    }

    /// File extension of the last path segment, without query string.
    pub fn extension(&self) -> Option<&str> {
        let path = self.0.split(['?', '#']).next().unwrap_or(&self.0);
        let file = path.rsplit('/').next()?;
        let (stem, ext) = file.rsplit_once('.')?;
        (!stem.is_empty()).then_some(ext)
    }

    /// Resolve an import string written inside this module.
    ///
    /// Handles absolute URLs, absolute paths and `./` / `../` relative imports
    /// (against either a local path or a remote URL). Bare specifiers such as
    /// `react` return `None`; those are left to resolve listeners.
    pub fn join(&self, import: &str) -> Option<Specifier> {
        if is_remote(import) {
            return Some(Self(Arc::from(clean_url(import))));
        }

        let relative = import.starts_with("./") || import.starts_with("../");
        let rooted = import.starts_with('/');
        if !relative && !rooted {
            return None;
        }

        if let Some((origin, path)) = split_origin(&self.0) {
            let joined = if rooted {
                import.to_string()
            } else {
                format!("{}/{}", parent_dir(path), import)
            };
            return Some(Self(Arc::from(format!("{origin}{}", clean_path(&joined)))));
        }

        if rooted {
            return Some(Self(Arc::from(clean_path(import))));
        }

        let joined = format!("{}/{}", parent_dir(&self.0), import);
        Some(Self(Arc::from(clean_path(&joined))))
    }
}

fn is_remote(value: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| value.starts_with(scheme))
}

/// `scheme:rest` with a scheme of at least two characters.
fn has_scheme(value: &str) -> bool {
    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && !rest.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Split `https://host/path` into (`https://host`, `/path`).
fn split_origin(value: &str) -> Option<(&str, &str)> {
    let scheme = REMOTE_SCHEMES.iter().find(|s| value.starts_with(*s))?;
    let rest = &value[scheme.len()..];
    match rest.find('/') {
        Some(idx) => Some(value.split_at(scheme.len() + idx)),
        None => Some((value, "/")),
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn clean_path(path: &str) -> String {
    let (path, suffix) = match path.find(['?', '#']) {
        Some(idx) => path.split_at(idx),
        None => (path, ""),
    };
    let cleaned = Path::new(path).clean();
    format!("{}{}", cleaned.to_string_lossy(), suffix)
}

fn clean_url(url: &str) -> String {
    match split_origin(url) {
        Some((origin, path)) => format!("{origin}{}", clean_path(path)),
        None => url.to_string(),
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specifier({:?})", &*self.0)
    }
}

impl AsRef<str> for Specifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Specifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Specifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Specifier::new(raw).map_err(serde::de::Error::custom)
    }
}
