//! Source registry — loads source definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`].

use crate::source_def::{SourceDefinition, parse_source_toml};

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[("boston", include_str!("../sources/boston.toml"))];

/// Identifier of the default source.
pub const DEFAULT_SOURCE_ID: &str = "boston_pd";

/// Returns all configured source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed.
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a source definition by its `id`.
#[must_use]
pub fn find_source(id: &str) -> Option<SourceDefinition> {
    all_sources().into_iter().find(|s| s.id == id)
}
