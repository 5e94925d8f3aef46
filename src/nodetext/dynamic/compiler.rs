//! Pipeline execution
//!
//! [`process`] runs a definition's operations in ascending phase order (ties in
//! declaration order), threading an [`Accumulator`] through them. A FORMAT step
//! is appended when no operation produces text. The compiler only computes the
//! output; writing it into targets is the project index's job.

use super::definition::DynamicDefinition;
use super::directive::{Accumulator, CompileContext, DirectiveOp, Outcome};
use super::directives::Format;
use crate::nodetext::config::Settings;
use crate::nodetext::node::{Node, NodeId};
use crate::nodetext::parsing::Buffer;
use std::sync::Arc;
use tracing::debug;

/// Node lookup the compiler runs against
pub trait NodeSource {
    fn get_node(&self, id: &str) -> Option<&Node>;

    /// Every node, in a stable order
    fn all_nodes(&self) -> Vec<&Node>;
}

impl NodeSource for Buffer {
    fn get_node(&self, id: &str) -> Option<&Node> {
        Buffer::get_node(self, id)
    }

    fn all_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().collect()
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    /// Text to write, or `None` when nothing should be written
    pub output: Option<String>,
    /// Final node selection
    pub selected: Vec<NodeId>,
    pub halted: bool,
}

/// Run `definition` against `nodes`.
pub fn process(
    definition: &DynamicDefinition,
    nodes: &dyn NodeSource,
    settings: &Settings,
) -> Compiled {
    let context = CompileContext::new(nodes, definition, settings);

    let mut operations: Vec<Arc<dyn DirectiveOp>> = definition.operations.clone();
    if !operations.iter().any(|op| op.produces_text()) {
        operations.push(Arc::new(Format::default()));
    }
    operations.sort_by_key(|op| op.phase());

    let mut accumulator = Accumulator::default();
    let mut halted = false;
    for operation in &operations {
        match operation.dynamic_output(&accumulator, &context) {
            Outcome::Replace(next) => accumulator = next,
            Outcome::Unchanged => {}
            Outcome::Halt => {
                debug!(
                    source = %definition.source_node_id,
                    directive = operation.name(),
                    "pipeline halted"
                );
                halted = true;
                break;
            }
        }
    }

    Compiled {
        output: accumulator.text.map(|text| indent(&text, definition.spaces)),
        selected: accumulator.nodes,
        halted,
    }
}

/// Prefix every non-empty line with `spaces` spaces.
pub fn indent(text: &str, spaces: usize) -> String {
    if spaces == 0 {
        return text.to_string();
    }
    let pad = " ".repeat(spaces);
    text.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect()
}
