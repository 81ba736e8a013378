use crate::chain::{ChainNode, StageChain, StageReference};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix marking a rule that also applies inside the dependency directory.
pub const GLOBAL_MARKER: &str = "global:";

/// A rule-table key: a glob, optionally prefixed with [`GLOBAL_MARKER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternKey {
    pub pattern: String,
    pub global: bool,
}

impl PatternKey {
    pub fn parse(key: &str) -> Self {
        match key.strip_prefix(GLOBAL_MARKER) {
            Some(pattern) => Self {
                pattern: pattern.to_string(),
                global: true,
            },
            None => Self {
                pattern: key.to_string(),
                global: false,
            },
        }
    }
}

/// Stage given as an object: `{"loader": "url", "query": {...}}`.
/// `name` and `parameters` are accepted as synonyms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageObject {
    #[serde(alias = "loader")]
    pub name: String,
    #[serde(default, alias = "query", skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// The forms a rule-table value may take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageShorthand {
    /// `"css"`, or `"css?modules"` with inline parameters.
    Name(String),
    Stage(StageObject),
    List(Vec<StageShorthand>),
}

impl StageShorthand {
    pub fn name(name: impl Into<String>) -> Self {
        StageShorthand::Name(name.into())
    }

    pub fn list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StageShorthand::List(names.into_iter().map(|n| StageShorthand::Name(n.into())).collect())
    }

    /// Chains described by this value under `pattern`.
    ///
    /// A list made only of lists yields one chain per inner list; any other
    /// value yields exactly one chain, with nested lists inlined in order.
    pub fn chains(&self, pattern: &str) -> Result<Vec<StageChain>, ConfigError> {
        let groups: Vec<&StageShorthand> = match self {
            StageShorthand::List(items)
                if !items.is_empty()
                    && items.iter().all(|i| matches!(i, StageShorthand::List(_))) =>
            {
                items.iter().collect()
            }
            other => vec![other],
        };

        groups
            .into_iter()
            .map(|group| {
                let chain = group.to_node(pattern)?.flatten();
                if chain.is_empty() {
                    return Err(ConfigError::InvalidStage {
                        pattern: pattern.to_string(),
                        reason: "no stages given".to_string(),
                    });
                }
                Ok(chain)
            })
            .collect()
    }

    fn to_node(&self, pattern: &str) -> Result<ChainNode, ConfigError> {
        match self {
            StageShorthand::Name(name) => Ok(ChainNode::Stage(parse_inline(name, pattern)?)),
            StageShorthand::Stage(object) => {
                let mut stage = parse_inline(&object.name, pattern)?;
                if object.parameters.is_some() {
                    stage.parameters = object.parameters.clone();
                }
                Ok(ChainNode::Stage(stage))
            }
            StageShorthand::List(items) => items
                .iter()
                .map(|item| item.to_node(pattern))
                .collect::<Result<Vec<_>, _>>()
                .map(ChainNode::Chain),
        }
    }
}

impl From<&str> for StageShorthand {
    fn from(name: &str) -> Self {
        StageShorthand::Name(name.to_string())
    }
}

/// Splits `css?modules` into a stage and its string parameters.
fn parse_inline(text: &str, pattern: &str) -> Result<StageReference, ConfigError> {
    let (name, query) = match text.split_once('?') {
        Some((name, query)) => (name.trim(), Some(query)),
        None => (text.trim(), None),
    };

    if name.is_empty() {
        return Err(ConfigError::InvalidStage {
            pattern: pattern.to_string(),
            reason: format!("empty stage name in '{}'", text),
        });
    }

    Ok(StageReference {
        name: name.to_string(),
        parameters: query
            .filter(|q| !q.is_empty())
            .map(|q| Value::String(q.to_string())),
    })
}
