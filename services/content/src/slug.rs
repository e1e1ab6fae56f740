//! Slug derivation for content records.
//!
//! # Purpose
//! Turns a `(namespace, name)` pair into the URL-safe key that uniquely
//! identifies a content record across the whole collection.
//!
//! # Key invariants
//! - Output only contains `[a-z0-9]` and single `-` separators.
//! - Output never starts or ends with `-`.
//! - The namespace always comes first: `("dsc", "catalog")` → `dsc-catalog`.
use regex::Regex;
use std::sync::LazyLock;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("static slug pattern"));

/// Derive the slug for a content record.
///
/// Lowercasing is ASCII-only so the result does not depend on locale. Input
/// made entirely of separators yields an empty string; callers decide whether
/// that is acceptable.
pub fn slug(namespace: &str, name: &str) -> String {
    normalize(&format!("{namespace} {name}"))
}

/// Normalize arbitrary text into slug form.
pub fn normalize(value: &str) -> String {
    let lowered = value.to_ascii_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
