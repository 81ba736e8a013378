use super::{ChainNode, StageReference};
use serde_json::Value;
use std::path::Path;

/// Token placed between stages in a request string.
pub const STAGE_SEPARATOR: &str = "!";

/// Query text for a parameter value, without the leading `?`.
///
/// Strings pass through as written. Everything else is compact JSON whose
/// object keys keep their insertion order, so equal chains always produce
/// equal requests.
pub fn encode_parameters(parameters: &Value) -> Option<String> {
    match parameters {
        Value::Null => None,
        Value::String(s) => {
            let s = s.strip_prefix('?').unwrap_or(s);
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}

/// Flattens `nodes` depth-first and joins every stage with [`STAGE_SEPARATOR`].
pub fn serialize(nodes: &[ChainNode]) -> String {
    let mut leaves: Vec<&StageReference> = Vec::new();
    collect_leaves(nodes, &mut leaves);

    leaves
        .iter()
        .map(|stage| stage.request())
        .collect::<Vec<_>>()
        .join(STAGE_SEPARATOR)
}

fn collect_leaves<'a>(nodes: &'a [ChainNode], out: &mut Vec<&'a StageReference>) {
    for node in nodes {
        match node {
            ChainNode::Stage(stage) => out.push(stage),
            ChainNode::Chain(children) => collect_leaves(children, out),
        }
    }
}

/// Request for a whole directory: `!!<chain>!<context>`, or `!!<context>`
/// when the chain is empty. The leading `!!` disables every configured rule
/// so only the given chain applies.
pub fn context_request(chain: &str, context: &Path) -> String {
    if chain.is_empty() {
        format!("{}{}{}", STAGE_SEPARATOR, STAGE_SEPARATOR, context.display())
    } else {
        format!(
            "{sep}{sep}{}{sep}{}",
            chain,
            context.display(),
            sep = STAGE_SEPARATOR
        )
    }
}
