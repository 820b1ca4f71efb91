//! Compiled-output IR: import path rewriting with recorded hash slots.
//!
//! Every static import of a compiled dependency is rewritten to
//! `/_kiln/<path>.js?v=<token>`. The byte offset of `<token>` is recorded at
//! generation time, so refreshing an embedded dependency hash later is a
//! fixed-width write at a known offset, never a rescan of the code.

use std::ops::Range;

use kiln_graph::{HashChain, HashSlot, Specifier, TOKEN_LEN};

use crate::error::ArtifactError;

/// URL prefix every compiled module is served under.
pub const OUTPUT_PREFIX: &str = "/_kiln";

const TOKEN_PARAM: &str = "?v=";
const PLACEHOLDER: [u8; TOKEN_LEN] = [b'0'; TOKEN_LEN];

/// Serving path of a module's compiled output.
///
/// `/src/app.ts` becomes `/_kiln/src/app.ts.js`;
/// `https://esm.sh/react@18` becomes `/_kiln/-/esm.sh/react@18.js`.
/// Query strings are folded into a short digest so distinct URLs never
/// share a path.
pub fn output_path(specifier: &Specifier) -> String {
    let raw = specifier.as_str();
    let (path, query) = match raw.find(['?', '#']) {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    };

    let mut out = String::from(OUTPUT_PREFIX);
    if let Some(rest) = path
        .strip_prefix("https://")
        .or_else(|| path.strip_prefix("http://"))
    {
        out.push_str("/-/");
        out.push_str(rest.trim_end_matches('/'));
    } else if path.starts_with('/') {
        out.push_str(path);
    } else {
        out.push_str("/-/");
        out.push_str(&path.replace(':', "/"));
    }

    if !query.is_empty() {
        out.push('@');
        out.push_str(&HashChain::source_hash(query.as_bytes())[..8]);
    }
    if !out.ends_with(".js") && !out.ends_with(".mjs") {
        out.push_str(".js");
    }
    out
}

/// How one import string in the code is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// Left pointing at the given URL (external modules).
    Url(String),
    /// A compiled module. `hashed` imports carry a hash token slot.
    Module { path: String, hashed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Byte range of the import string's contents.
    pub range: Range<usize>,
    pub target: ImportTarget,
}

/// Rewritten code plus a slot per input rewrite (same order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub code: Vec<u8>,
    pub slots: Vec<Option<HashSlot>>,
}

/// Apply `rewrites` to `code`. Hashed imports get a placeholder token whose
/// position is returned as a [`HashSlot`]. Rewrites with overlapping or
/// out-of-bounds ranges are skipped.
pub fn emit(code: &str, rewrites: &[Rewrite]) -> Emitted {
    let mut order: Vec<usize> = (0..rewrites.len()).collect();
    order.sort_by_key(|&i| rewrites[i].range.start);

    let mut out = Vec::with_capacity(code.len() + rewrites.len() * 32);
    let mut slots = vec![None; rewrites.len()];
    let mut cursor = 0;

    for i in order {
        let rewrite = &rewrites[i];
        let range = rewrite.range.clone();
        if range.start < cursor || code.get(range.clone()).is_none() {
            continue;
        }

        out.extend_from_slice(&code.as_bytes()[cursor..range.start]);
        match &rewrite.target {
            ImportTarget::Url(url) => out.extend_from_slice(url.as_bytes()),
            ImportTarget::Module { path, hashed } => {
                out.extend_from_slice(path.as_bytes());
                if *hashed {
                    out.extend_from_slice(TOKEN_PARAM.as_bytes());
                    slots[i] = Some(HashSlot::new(out.len(), TOKEN_LEN));
                    out.extend_from_slice(&PLACEHOLDER);
                }
            }
        }
        cursor = range.end;
    }
    out.extend_from_slice(&code.as_bytes()[cursor..]);

    Emitted { code: out, slots }
}

/// Write `token` into `code` at `slot`. Returns whether any byte changed.
pub fn patch(
    specifier: &Specifier,
    code: &mut [u8],
    slot: HashSlot,
    token: &str,
) -> Result<bool, ArtifactError> {
    let size = code.len();
    let target = code
        .get_mut(slot.offset..slot.end())
        .filter(|bytes| bytes.len() == token.len())
        .ok_or_else(|| ArtifactError::SlotOutOfRange {
            specifier: specifier.clone(),
            offset: slot.offset,
            end: slot.end(),
            size,
        })?;

    if target == token.as_bytes() {
        return Ok(false);
    }
    target.copy_from_slice(token.as_bytes());
    Ok(true)
}
