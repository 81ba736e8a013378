use super::shorthand::{PatternKey, StageShorthand};
use super::RuleTable;
use crate::chain::StageChain;
use crate::error::ConfigError;
use crate::glob::{compile_glob, is_literal_segment};
use crate::resolve::StageResolver;
use globset::GlobMatcher;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Directory name non-global rules never reach into.
pub const DEFAULT_DEPENDENCY_DIR: &str = "node_modules";

/// Predicate over absolute file paths.
#[derive(Debug, Clone)]
pub struct RulePredicate {
    pattern: String,
    matcher: GlobMatcher,
    excluded_dir: Option<String>,
}

impl RulePredicate {
    pub fn is_match(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if let Some(dir) = &self.excluded_dir {
            let inside = path
                .components()
                .any(|c| matches!(c, Component::Normal(name) if name == dir.as_str()));
            if inside {
                return false;
            }
        }
        self.matcher.is_match(path)
    }

    /// The context-joined glob this predicate matches against.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for RulePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// One compiled rule: which files it applies to and the chain they get.
#[derive(Debug, Clone)]
pub struct RuleRecord {
    /// Pattern as written in the rule table, marker removed.
    pub pattern: String,
    pub predicate: RulePredicate,
    pub stage_chain: StageChain,
    pub exclude_dependency_dir: bool,
}

impl RuleRecord {
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        self.predicate.is_match(path)
    }

    pub fn is_global(&self) -> bool {
        !self.exclude_dependency_dir
    }

    pub fn request(&self) -> String {
        self.stage_chain.request()
    }
}

impl Serialize for RuleRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RuleRecord", 4)?;
        state.serialize_field("test", self.predicate.pattern())?;
        state.serialize_field("stages", &self.stage_chain)?;
        state.serialize_field("request", &self.request())?;
        state.serialize_field("excludeDependencyDir", &self.exclude_dependency_dir)?;
        state.end()
    }
}

/// Normalizes pattern-keyed rule tables into ordered [`RuleRecord`]s.
///
/// Output order follows table order. Overlapping rules are left for the
/// consumer, which applies the last matching rule per file.
pub struct RuleSetCompiler<'a> {
    context: PathBuf,
    dependency_dir: String,
    resolver: Option<&'a StageResolver>,
}

impl<'a> RuleSetCompiler<'a> {
    pub fn new(context: impl Into<PathBuf>) -> Self {
        Self {
            context: context.into(),
            dependency_dir: DEFAULT_DEPENDENCY_DIR.to_string(),
            resolver: None,
        }
    }

    pub fn dependency_dir(mut self, name: impl Into<String>) -> Self {
        self.dependency_dir = name.into();
        self
    }

    /// Resolve every stage name against the context while compiling.
    pub fn with_resolver(mut self, resolver: &'a StageResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn compile(&self, table: &RuleTable) -> Result<Vec<RuleRecord>, ConfigError> {
        let mut records = Vec::with_capacity(table.len());
        for (key, shorthand) in table {
            records.extend(self.compile_rule(key, shorthand)?);
        }
        debug!(
            "Compiled {} rule(s) from {} pattern(s) under {}",
            records.len(),
            table.len(),
            self.context.display()
        );
        Ok(records)
    }

    pub fn compile_rule(
        &self,
        key: &str,
        shorthand: &StageShorthand,
    ) -> Result<Vec<RuleRecord>, ConfigError> {
        let PatternKey { pattern, global } = PatternKey::parse(key);
        let predicate = self.predicate(&pattern, global)?;

        shorthand
            .chains(&pattern)?
            .into_iter()
            .map(|chain| -> Result<RuleRecord, ConfigError> {
                let stage_chain = match self.resolver {
                    Some(resolver) => resolver.resolve_chain(&chain, &self.context)?,
                    None => chain,
                };
                debug!(
                    pattern = %pattern,
                    global,
                    request = %stage_chain.request(),
                    "Compiled rule"
                );
                Ok(RuleRecord {
                    pattern: pattern.clone(),
                    predicate: predicate.clone(),
                    stage_chain,
                    exclude_dependency_dir: !global,
                })
            })
            .collect()
    }

    fn predicate(&self, pattern: &str, global: bool) -> Result<RulePredicate, ConfigError> {
        let joined = join_pattern(&self.context, pattern);
        let matcher = compile_glob(&joined, pattern)?;
        Ok(RulePredicate {
            pattern: joined,
            matcher,
            excluded_dir: (!global).then(|| self.dependency_dir.clone()),
        })
    }
}

/// `context/pattern`, with glob syntax in the context escaped.
///
/// The literal prefix of the result is normalized lexically: `.` segments
/// are dropped and `..` removes the segment before it. Segments from the
/// first dynamic one onward are kept verbatim.
fn join_pattern(context: &Path, pattern: &str) -> String {
    let (rooted, mut segments, rest) = match pattern.strip_prefix('/') {
        Some(rest) => (true, Vec::new(), rest),
        None => {
            let context = context.to_string_lossy();
            let segments: Vec<String> = context
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(globset::escape)
                .collect();
            (context.starts_with('/'), segments, pattern)
        }
    };

    let mut parts = rest.split('/').peekable();
    while let Some(segment) = parts.next_if(|segment| is_literal_segment(segment)) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            literal => segments.push(literal.to_string()),
        }
    }
    segments.extend(parts.map(str::to_string));

    let joined = segments.join("/");
    if rooted {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Compiles `table` under `context` with default settings.
pub fn compile_rules(table: &RuleTable, context: &Path) -> Result<Vec<RuleRecord>, ConfigError> {
    RuleSetCompiler::new(context).compile(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use serde_json::json;
    use std::sync::Arc;

    fn table(value: serde_json::Value) -> RuleTable {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_style_and_global_json_rules() {
        let rules = compile_rules(
            &table(json!({"**/*.css": ["style", "css"], "global:**/*.json": "json"})),
            Path::new("/proj"),
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules[0].exclude_dependency_dir);
        assert_eq!(rules[0].request(), "style!css");
        assert_eq!(rules[0].pattern, "**/*.css");
        assert!(!rules[1].exclude_dependency_dir);
        assert_eq!(rules[1].request(), "json");
        assert_eq!(rules[1].pattern, "**/*.json");
    }

    #[test]
    fn test_dependency_dir_exclusion() {
        let rules = compile_rules(
            &table(json!({"**/*.js": "babel", "global:**/*.js": "source-map"})),
            Path::new("/proj"),
        )
        .unwrap();

        let local = &rules[0];
        let global = &rules[1];
        assert!(local.matches("/proj/src/app.js"));
        assert!(!local.matches("/proj/node_modules/react/index.js"));
        assert!(!local.matches("/proj/src/node_modules/x.js"));
        assert!(global.matches("/proj/node_modules/react/index.js"));
    }

    #[test]
    fn test_dependency_dir_is_a_whole_segment() {
        let rules = compile_rules(&table(json!({"**/*.js": "babel"})), Path::new("/proj")).unwrap();
        assert!(rules[0].matches("/proj/src/node_modules_shim/a.js"));
    }

    #[test]
    fn test_dotfiles_participate() {
        let rules =
            compile_rules(&table(json!({"**/*.css": "css"})), Path::new("/proj")).unwrap();
        assert!(rules[0].matches("/proj/.storybook/theme.css"));
        assert!(rules[0].matches("/proj/src/.hidden.css"));
    }

    #[test]
    fn test_predicate_is_rooted_at_context() {
        let rules = compile_rules(&table(json!({"src/*.js": "babel"})), Path::new("/proj")).unwrap();
        assert_eq!(rules[0].predicate.pattern(), "/proj/src/*.js");
        assert!(rules[0].matches("/proj/src/a.js"));
        assert!(!rules[0].matches("/other/src/a.js"));
        assert!(!rules[0].matches("/proj/src/lib/a.js"));
    }

    #[test]
    fn test_dot_prefixed_key_matches_under_context() {
        let rules =
            compile_rules(&table(json!({"./src/**/*.js": "babel"})), Path::new("/proj")).unwrap();
        assert_eq!(rules[0].pattern, "./src/**/*.js");
        assert_eq!(rules[0].predicate.pattern(), "/proj/src/**/*.js");
        assert!(rules[0].matches("/proj/src/app.js"));
        assert!(rules[0].matches("/proj/src/lib/util.js"));
        assert!(!rules[0].matches("/proj/test/app.js"));
    }

    #[test]
    fn test_parent_key_climbs_out_of_context() {
        let rules =
            compile_rules(&table(json!({"../shared/*.js": "babel"})), Path::new("/proj/app"))
                .unwrap();
        assert_eq!(rules[0].predicate.pattern(), "/proj/shared/*.js");
        assert!(rules[0].matches("/proj/shared/format.js"));
        assert!(!rules[0].matches("/proj/app/shared/format.js"));
    }

    #[test]
    fn test_join_pattern_keeps_dynamic_tail() {
        assert_eq!(
            join_pattern(Path::new("/proj/"), "src/./a/../**/*.css"),
            "/proj/src/**/*.css"
        );
        assert_eq!(join_pattern(Path::new("/proj"), "**/../x/*.js"), "/proj/**/../x/*.js");
        assert_eq!(join_pattern(Path::new("/proj"), "/abs/./lib/*.js"), "/abs/lib/*.js");
        assert_eq!(join_pattern(Path::new("rel"), "./*.js"), "rel/*.js");
    }

    #[test]
    fn test_context_with_glob_characters_is_escaped() {
        let rules =
            compile_rules(&table(json!({"*.js": "babel"})), Path::new("/work/[draft]")).unwrap();
        assert!(rules[0].matches("/work/[draft]/a.js"));
        assert!(!rules[0].matches("/work/d/a.js"));
    }

    #[test]
    fn test_table_order_is_preserved() {
        let rules = compile_rules(
            &table(json!({"z/**": "a", "a/**": "b", "m/**": ["c", "d"]})),
            Path::new("/p"),
        )
        .unwrap();
        let patterns: Vec<&str> = rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["z/**", "a/**", "m/**"]);
    }

    #[test]
    fn test_list_of_lists_expands_into_records() {
        let rules = compile_rules(
            &table(json!({"**/*.css": [["style", "css"], ["csslint"]]})),
            Path::new("/p"),
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].request(), "style!css");
        assert_eq!(rules[1].request(), "csslint");
        assert_eq!(rules[0].pattern, rules[1].pattern);
    }

    #[test]
    fn test_custom_dependency_dir() {
        let rules = RuleSetCompiler::new("/proj")
            .dependency_dir("vendor")
            .compile(&table(json!({"**/*.js": "babel"})))
            .unwrap();
        assert!(!rules[0].matches("/proj/vendor/lib.js"));
        assert!(rules[0].matches("/proj/node_modules/lib.js"));
    }

    #[test]
    fn test_malformed_pattern_fails() {
        let err = compile_rules(&table(json!({"src/[z-a].js": "babel"})), Path::new("/p"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "src/[z-a].js"));
    }

    #[test]
    fn test_compile_with_resolver() {
        let fs = MockFileSystem::with_root(PathBuf::from("/proj"));
        fs.add_file("node_modules/json-loader/index.js", "");
        let resolver = StageResolver::new(Arc::new(fs));

        let rules = RuleSetCompiler::new("/proj")
            .with_resolver(&resolver)
            .compile(&table(json!({"**/*.json": "json"})))
            .unwrap();
        assert_eq!(rules[0].request(), "/proj/node_modules/json-loader/index.js");

        let err = RuleSetCompiler::new("/proj")
            .with_resolver(&resolver)
            .compile(&table(json!({"**/*.css": "css"})))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Resolution(_)));
    }

    #[test]
    fn test_serialized_record() {
        let rules = compile_rules(&table(json!({"**/*.css": ["style", "css"]})), Path::new("/p")).unwrap();
        let value = serde_json::to_value(&rules[0]).unwrap();
        assert_eq!(value["test"], "/p/**/*.css");
        assert_eq!(value["request"], "style!css");
        assert_eq!(value["excludeDependencyDir"], true);
        assert_eq!(value["stages"][1]["name"], "css");
    }
}
