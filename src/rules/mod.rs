//! Rule tables and their compilation into rule records

mod compiler;
mod shorthand;

pub use compiler::{
    compile_rules, RulePredicate, RuleRecord, RuleSetCompiler, DEFAULT_DEPENDENCY_DIR,
};
pub use shorthand::{PatternKey, StageObject, StageShorthand, GLOBAL_MARKER};

use indexmap::IndexMap;

/// Pattern key to stage shorthand, in declaration order.
pub type RuleTable = IndexMap<String, StageShorthand>;
