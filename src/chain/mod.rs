//! Stage references, stage chains and their request-string form

mod request;

pub use request::{context_request, encode_parameters, serialize, STAGE_SEPARATOR};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stages under this prefix are provided by the pipeline itself and are
/// never looked up on disk.
pub const BUILTIN_PREFIX: &str = "builtin:";

/// One named stage plus the parameters bound to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl StageReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(name: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            parameters: Some(parameters),
        }
    }

    /// `name` or `name?<parameters>`.
    pub fn request(&self) -> String {
        match self.parameters.as_ref().and_then(encode_parameters) {
            Some(query) => format!("{}?{}", self.name, query),
            None => self.name.clone(),
        }
    }
}

/// Ordered stages applied to one file. List order is application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageChain(Vec<StageReference>);

impl StageChain {
    pub fn new(stages: Vec<StageReference>) -> Self {
        Self(stages)
    }

    pub fn stages(&self) -> &[StageReference] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StageReference> {
        self.0.iter()
    }

    /// A new chain with `stage` placed in front of these stages.
    pub fn prepend(&self, stage: StageReference) -> Self {
        let mut stages = Vec::with_capacity(self.0.len() + 1);
        stages.push(stage);
        stages.extend(self.0.iter().cloned());
        Self(stages)
    }

    pub fn request(&self) -> String {
        self.0
            .iter()
            .map(StageReference::request)
            .collect::<Vec<_>>()
            .join(STAGE_SEPARATOR)
    }
}

impl From<Vec<StageReference>> for StageChain {
    fn from(stages: Vec<StageReference>) -> Self {
        Self(stages)
    }
}

impl IntoIterator for StageChain {
    type Item = StageReference;
    type IntoIter = std::vec::IntoIter<StageReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StageChain {
    type Item = &'a StageReference;
    type IntoIter = std::slice::Iter<'a, StageReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Input to the request serializer: a stage, or a sub-chain inlined at its
/// position.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainNode {
    Stage(StageReference),
    Chain(Vec<ChainNode>),
}

impl ChainNode {
    /// Leaves in depth-first order.
    pub fn flatten(&self) -> StageChain {
        fn walk(node: &ChainNode, out: &mut Vec<StageReference>) {
            match node {
                ChainNode::Stage(stage) => out.push(stage.clone()),
                ChainNode::Chain(children) => children.iter().for_each(|c| walk(c, out)),
            }
        }

        let mut stages = Vec::new();
        walk(self, &mut stages);
        StageChain(stages)
    }
}

impl From<StageReference> for ChainNode {
    fn from(stage: StageReference) -> Self {
        ChainNode::Stage(stage)
    }
}

impl From<StageChain> for ChainNode {
    fn from(chain: StageChain) -> Self {
        ChainNode::Chain(chain.into_iter().map(ChainNode::Stage).collect())
    }
}

impl From<&str> for ChainNode {
    fn from(name: &str) -> Self {
        ChainNode::Stage(StageReference::new(name))
    }
}
