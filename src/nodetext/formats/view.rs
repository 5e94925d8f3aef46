//! Subtree views over a buffer

use crate::nodetext::error::FormatError;
use crate::nodetext::node::Node;
use crate::nodetext::parsing::Buffer;

/// One node of a buffer and everything nested under it
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    buffer: &'a Buffer,
    top: &'a Node,
}

impl<'a> View<'a> {
    /// The whole buffer, starting at its root node
    pub fn of_buffer(buffer: &'a Buffer) -> Result<Self, FormatError> {
        let top = buffer
            .root_node()
            .ok_or_else(|| FormatError::Unparsed(buffer.filename.clone()))?;
        Ok(View { buffer, top })
    }

    /// The subtree under node `id`
    pub fn of_node(buffer: &'a Buffer, id: &str) -> Result<Self, FormatError> {
        let top = buffer.get_node(id).ok_or_else(|| FormatError::UnknownNode {
            id: id.to_string(),
            path: buffer.filename.clone(),
        })?;
        Ok(View { buffer, top })
    }

    pub fn top(&self) -> &'a Node {
        self.top
    }

    pub fn children(&self, node: &Node) -> Vec<&'a Node> {
        self.buffer.children_of(node)
    }
}
