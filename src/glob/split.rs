use super::{compile_glob, is_literal_segment};
use crate::error::ConfigError;
use globset::GlobMatcher;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Prefix the pipeline puts on paths it reports relative to a scope root.
pub const RELATIVE_MARKER: &str = "./";

/// A pattern decomposed into a literal directory scope and a predicate over
/// paths relative to that scope.
#[derive(Debug, Clone)]
pub struct ScopeSplit {
    /// Longest literal prefix of the pattern, segments joined with `/`.
    /// Empty when the first segment is already dynamic.
    pub scope: String,
    /// Pattern text left after the scope, without its leading separator.
    pub local_pattern: String,
    pub predicate: ScopePredicate,
}

impl ScopeSplit {
    /// The scope as a directory under `context`.
    pub fn scope_dir(&self, context: &Path) -> PathBuf {
        if self.scope.is_empty() {
            context.to_path_buf()
        } else {
            context.join(&self.scope)
        }
    }
}

/// Match predicate for paths below a scope root.
///
/// Non-global predicates only accept candidates written with the
/// [`RELATIVE_MARKER`] prefix; anything else is rejected before matching.
/// That mirrors how the pipeline reports scoped paths and may be nothing
/// more than a formatting convention of the host.
#[derive(Debug, Clone)]
pub struct ScopePredicate {
    pattern: String,
    matcher: GlobMatcher,
    global: bool,
}

impl ScopePredicate {
    pub fn is_match(&self, candidate: &str) -> bool {
        let relative = match candidate.strip_prefix(RELATIVE_MARKER) {
            Some(rest) => rest,
            None if self.global => candidate,
            None => return false,
        };
        self.matcher.is_match(relative)
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    /// The full pattern this predicate was split from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for ScopePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Splits `pattern` into its literal scope and a predicate for the rest.
pub fn split(pattern: &str, global: bool) -> Result<ScopeSplit, ConfigError> {
    let segments: Vec<&str> = pattern.split('/').collect();

    let literal: Vec<&str> = segments
        .iter()
        .take_while(|segment| is_literal_segment(segment))
        .copied()
        .collect();

    // A fully literal pattern keeps every segment in the scope.
    let scope = literal.join("/");

    let rest = &pattern[scope.len()..];
    let local_pattern = rest.strip_prefix('/').unwrap_or(rest).to_string();

    let matcher = compile_glob(&local_pattern, pattern)?;

    trace!(
        pattern,
        scope = %scope,
        local = %local_pattern,
        global,
        "Split glob pattern"
    );

    Ok(ScopeSplit {
        scope,
        local_pattern,
        predicate: ScopePredicate {
            pattern: pattern.to_string(),
            matcher,
            global,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        nested_scope = { "src/styles/**/*.css", "src/styles", "**/*.css" },
        single_dir = { "src/*.js", "src", "*.js" },
        no_literal = { "**/*.json", "", "**/*.json" },
        leading_wildcard_segment = { "*/index.js", "", "*/index.js" },
        brace_stops_scope = { "lib/{a,b}/*.ts", "lib", "{a,b}/*.ts" },
        class_stops_scope = { "test/fixture[0-9]/in.txt", "test", "fixture[0-9]/in.txt" },
        absolute = { "/abs/dist/*.map", "/abs/dist", "*.map" },
        dot_dirs = { ".storybook/config/*.js", ".storybook/config", "*.js" },
        fully_literal = { "src/index.js", "src/index.js", "" },
        npm_scope = { "node_modules/@babel/core/**/*.js", "node_modules/@babel/core", "**/*.js" },
        route_group = { "app/(marketing)/about/*.tsx", "app/(marketing)/about", "*.tsx" },
        extglob_stops_scope = { "lib/@(a|b)/*.js", "lib", "@(a|b)/*.js" },
    )]
    fn test_split_scope(pattern: &str, scope: &str, local: &str) {
        let split = split(pattern, false).unwrap();
        assert_eq!(split.scope, scope);
        assert_eq!(split.local_pattern, local);
    }

    #[test]
    fn test_non_global_requires_relative_marker() {
        let split = split("src/**/*.css", false).unwrap();
        assert!(split.predicate.is_match("./button.css"));
        assert!(split.predicate.is_match("./deep/nested/theme.css"));
        assert!(!split.predicate.is_match("button.css"));
        assert!(!split.predicate.is_match("./button.js"));
    }

    #[test]
    fn test_global_accepts_unprefixed_paths() {
        let split = split("**/*.json", true).unwrap();
        assert!(split.predicate.is_global());
        assert!(split.predicate.is_match("package.json"));
        assert!(split.predicate.is_match("./node_modules/x/package.json"));
    }

    #[test]
    fn test_predicate_displays_full_pattern() {
        let split = split("src/**/*.css", false).unwrap();
        assert_eq!(split.predicate.to_string(), "src/**/*.css");
        assert_eq!(split.predicate.pattern(), "src/**/*.css");
    }

    #[test]
    fn test_scope_dir_joins_context() {
        let context = Path::new("/proj");
        assert_eq!(
            split("src/*.js", false).unwrap().scope_dir(context),
            PathBuf::from("/proj/src")
        );
        assert_eq!(
            split("**/*.js", false).unwrap().scope_dir(context),
            PathBuf::from("/proj")
        );
    }

    #[parameterized(
        css = { "src/styles/**/*.css", "a/b/site.css" },
        js = { "src/*.js", "index.js" },
        braces = { "lib/{a,b}/*.ts", "b/mod.ts" },
        hidden = { "config/**/*", ".env/local" },
        npm_scope = { "node_modules/@babel/core/**/*.js", "lib/index.js" },
        route_group = { "app/(marketing)/**/*.tsx", "about/page.tsx" },
    )]
    fn test_recombined_path_matches_full_pattern(pattern: &str, relative: &str) {
        let split = split(pattern, false).unwrap();
        let relative_with_marker = format!("{}{}", RELATIVE_MARKER, relative);
        assert!(split.predicate.is_match(&relative_with_marker));

        let full = compile_glob(pattern, pattern).unwrap();
        let recombined = format!("{}/{}", split.scope, relative);
        assert!(full.is_match(recombined.as_str()));
    }

    #[test]
    fn test_malformed_pattern_is_config_error() {
        let err = split("src/[z-a/*.js", false).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert!(err.to_string().contains("src/[z-a/*.js"));
    }
}
