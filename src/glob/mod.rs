//! Glob compilation and scope splitting
//!
//! Patterns are compiled with `globset`. Two settings hold everywhere in the
//! crate: `*` never crosses a `/`, and dotfiles take part in matching like
//! any other name.

mod split;

pub use split::{split, ScopePredicate, ScopeSplit, RELATIVE_MARKER};

use crate::error::ConfigError;
use globset::{GlobBuilder, GlobMatcher};

/// Characters that make a path segment dynamic.
const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}', '\\'];

/// Extglob openers. `@`, `!` and `+` are plain text unless a `(` follows.
const EXTGLOB_OPENERS: &[&str] = &["@(", "!(", "+("];

/// True when a segment contains no glob syntax at all.
pub fn is_literal_segment(segment: &str) -> bool {
    !segment.contains(GLOB_META) && !EXTGLOB_OPENERS.iter().any(|opener| segment.contains(opener))
}

/// Compiles `pattern`, reporting failures against `source` (the pattern the
/// user actually wrote, which may be longer than `pattern`).
pub fn compile_glob(pattern: &str, source: &str) -> Result<GlobMatcher, ConfigError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| ConfigError::invalid_pattern(source, e.kind()))
}
