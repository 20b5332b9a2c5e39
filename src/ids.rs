//! Entity id generation and resolution.
//!
//! Ids look like `tsk-01hq3k8f`: a short entity prefix plus the last
//! eight characters of a lowercased ULID. Lookups accept any unambiguous
//! prefix of a stored id.

use std::collections::HashSet;

use ulid::Ulid;

use crate::error::{Error, Result};

const ID_SUFFIX_LEN: usize = 8;

/// Generate a fresh id with the given prefix, avoiding collisions with
/// existing ids
pub fn generate_id(prefix: &str, existing: &HashSet<String>) -> String {
    loop {
        let raw = Ulid::new().to_string().to_ascii_lowercase();
        let candidate = format!("{prefix}-{}", &raw[raw.len() - ID_SUFFIX_LEN..]);
        if !existing.contains(&candidate) {
            return candidate;
        }
    }
}

/// Resolve user input against stored ids by exact match or unambiguous
/// prefix
///
/// Returns `Ok(None)` when nothing matches; the caller maps that to its
/// entity's not-found error.
pub fn try_resolve(input: &str, ids: &[String]) -> Result<Option<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("id cannot be empty".to_string()));
    }
    let needle = trimmed.to_ascii_lowercase();

    let mut exact = Vec::new();
    let mut prefix = Vec::new();
    for id in ids {
        let lowered = id.to_ascii_lowercase();
        if lowered == needle {
            exact.push(id.clone());
            continue;
        }
        if lowered.starts_with(&needle) {
            prefix.push(id.clone());
        }
    }

    if exact.len() == 1 {
        return Ok(exact.pop());
    }
    if exact.len() > 1 {
        return Err(Error::AmbiguousId {
            id: trimmed.to_string(),
            candidates: exact,
        });
    }

    prefix.sort();
    prefix.dedup();
    if prefix.len() > 1 {
        return Err(Error::AmbiguousId {
            id: trimmed.to_string(),
            candidates: prefix,
        });
    }
    Ok(prefix.into_iter().next())
}
