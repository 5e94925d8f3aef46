//! Parsed buffers
//!
//! [`Buffer::build`] turns the raw arena into [`Node`]s: own content, metadata,
//! dynamic definitions and identity per node, then the tree pass that links
//! parents and children, attaches node-valued entries (`key::{ ... }`) to the
//! parent and copies `*`/`**` tag entries down the tree.

use super::parser::RawNode;
use super::ParseContext;
use crate::nodetext::dynamic::DynamicDefinition;
use crate::nodetext::error::{DirectiveError, ParseError};
use crate::nodetext::metadata::{Metadata, MetadataEntry, MetadataValue};
use crate::nodetext::node::{Node, NodeId};
use crate::nodetext::syntax;
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::warn;

/// The parsed representation of one file
#[derive(Debug, Clone, Serialize)]
pub struct Buffer {
    pub filename: PathBuf,
    /// Current text, after healing
    pub contents: String,
    /// Nodes ordered by start position, then depth; the root comes first
    pub nodes: Vec<Node>,
    pub root: Option<NodeId>,
    pub has_errors: bool,
    /// True when healing changed the text
    pub healed: bool,
    #[serde(skip)]
    pub errors: Vec<ParseError>,
    #[serde(skip)]
    pub directive_errors: Vec<(NodeId, DirectiveError)>,
}

impl Buffer {
    pub(crate) fn build(
        filename: &Path,
        contents: String,
        raw: Vec<RawNode>,
        root: usize,
        healed: bool,
        context: &ParseContext,
    ) -> Buffer {
        let mut directive_errors = Vec::new();
        let mut nodes: Vec<Node> = raw
            .iter()
            .map(|raw| build_node(filename, &contents, raw, context, &mut directive_errors))
            .collect();

        let mut parent_of: Vec<Option<usize>> = vec![None; raw.len()];
        for (index, node) in raw.iter().enumerate() {
            let parent_id = nodes[index].id.clone();
            let child_ids: Vec<NodeId> =
                node.children.iter().map(|&c| nodes[c].id.clone()).collect();
            nodes[index].children = child_ids;
            for &child in &node.children {
                nodes[child].parent = Some(parent_id.clone());
                parent_of[child] = Some(index);
            }
        }

        link_node_valued(&contents, &raw, &parent_of, &mut nodes);
        propagate_tags(&raw, root, &mut nodes);

        let root_id = nodes[root].id.clone();
        nodes.sort_by_key(|node| (node.start_position(), node.nested_depth));

        Buffer {
            filename: filename.to_path_buf(),
            contents,
            nodes,
            root: Some(root_id),
            has_errors: false,
            healed,
            errors: Vec::new(),
            directive_errors,
        }
    }

    /// A buffer whose structure could not be recovered. Keeps the original text.
    pub(crate) fn unparsed(filename: &Path, contents: &str, error: ParseError) -> Buffer {
        Buffer {
            filename: filename.to_path_buf(),
            contents: contents.to_string(),
            nodes: Vec::new(),
            root: None,
            has_errors: true,
            healed: false,
            errors: vec![error],
            directive_errors: Vec::new(),
        }
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.as_deref().and_then(|id| self.get_node(id))
    }

    /// The node whose own content contains `offset`
    pub fn node_at(&self, offset: usize) -> Option<&Node> {
        self.nodes.iter().find(|node| node.contains_offset(offset))
    }

    /// Direct children of `node`, in text order.
    ///
    /// Found by position rather than by id, so repeated ids cannot confuse a walk.
    pub fn children_of(&self, node: &Node) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|other| {
                other.nested_depth == node.nested_depth + 1
                    && other.wrapper_span.start >= node.wrapper_span.start
                    && other.wrapper_span.end <= node.wrapper_span.end
            })
            .collect()
    }

    /// Rebuild the text by walking the tree: own ranges interleaved with each
    /// child's wrapped rendering. Equals `contents` for every parsed buffer.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.contents.len());
        if let Some(root) = self.root_node() {
            self.render(root, &mut out);
        }
        out
    }

    fn render(&self, node: &Node, out: &mut String) {
        enum Piece<'n> {
            Own(Range<usize>),
            Child(&'n Node),
        }

        let mut pieces: Vec<(usize, Piece)> = node
            .ranges
            .iter()
            .map(|range| (range.start, Piece::Own(range.clone())))
            .collect();
        for child in self.children_of(node) {
            pieces.push((child.wrapper_span.start, Piece::Child(child)));
        }
        pieces.sort_by_key(|(start, _)| *start);

        for (_, piece) in pieces {
            match piece {
                Piece::Own(range) => out.push_str(&self.contents[range]),
                Piece::Child(child) => {
                    let span = &child.wrapper_span;
                    out.push_str(&self.contents[span.start..child.start_position()]);
                    self.render(child, out);
                    out.push_str(&self.contents[child.end_position()..span.end]);
                }
            }
        }
    }
}

/// Maps offsets in a node's joined source back to buffer offsets.
struct SourceMap {
    /// (offset in joined source, offset in buffer) per range
    segments: Vec<(usize, usize)>,
}

impl SourceMap {
    fn to_buffer(&self, offset: usize) -> usize {
        self.segments
            .iter()
            .rev()
            .find(|(source, _)| *source <= offset)
            .map(|(source, buffer)| buffer + (offset - source))
            .unwrap_or(offset)
    }
}

/// Own ranges joined by newlines, so text on either side of a child never runs
/// together into one line.
fn joined_source(text: &str, ranges: &[Range<usize>]) -> (String, SourceMap) {
    let mut source = String::new();
    let mut segments = Vec::with_capacity(ranges.len());
    for (i, range) in ranges.iter().enumerate() {
        if i > 0 {
            source.push('\n');
        }
        segments.push((source.len(), range.start));
        source.push_str(&text[range.clone()]);
    }
    (source, SourceMap { segments })
}

fn build_node(
    filename: &Path,
    text: &str,
    raw: &RawNode,
    context: &ParseContext,
    directive_errors: &mut Vec<(NodeId, DirectiveError)>,
) -> Node {
    let settings = &context.settings.parsing;
    let contents: String = raw.ranges.iter().map(|r| &text[r.clone()]).collect();
    let mut node = Node::new(filename, raw.ranges.clone(), contents, raw.depth);
    node.is_root = raw.is_root;
    node.is_compact = raw.is_compact;
    node.wrapper_span = raw.wrapper_span.clone();
    node.pointers = raw.pointers.clone();

    let (source, map) = joined_source(text, &raw.ranges);
    let without_embedded = syntax::mask(&source, &syntax::EMBEDDED_REGION);
    let metadata_source = syntax::mask(&without_embedded, &syntax::DYNAMIC_DEFINITION);

    node.metadata = Metadata::parse(&metadata_source, settings);
    node.metadata.map_positions(|offset| map.to_buffer(offset));
    node.resolve_identity(settings, &source);

    for caps in syntax::DYNAMIC_DEFINITION.captures_iter(&without_embedded) {
        let (Some(whole), Some(parameters)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let definition_text = &source[whole.range()];
        let position = map.to_buffer(whole.start());
        match DynamicDefinition::parse(
            parameters.as_str(),
            definition_text,
            &node.id,
            position,
            context.registry,
            context.settings,
        ) {
            Ok(definition) => node.dynamic_definitions.push(definition),
            Err(err) => {
                warn!(
                    file = %filename.display(),
                    node = %node.id,
                    error = %err,
                    "skipping dynamic definition"
                );
                directive_errors.push((node.id.clone(), err));
            }
        }
    }
    node
}

/// `key::{ child }` makes the child the value of `key` on the parent.
fn link_node_valued(
    text: &str,
    raw: &[RawNode],
    parent_of: &[Option<usize>],
    nodes: &mut [Node],
) {
    for (index, node) in raw.iter().enumerate() {
        if node.is_root || node.is_compact {
            continue;
        }
        let Some(parent) = parent_of[index] else {
            continue;
        };
        let opened_at = node.wrapper_span.start;
        let line_start = text[..opened_at].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let Some(caps) = syntax::NODE_VALUED_KEY.captures(&text[line_start..opened_at]) else {
            continue;
        };
        let Some(key) = caps.get(1) else { continue };

        let mut entry = MetadataEntry::new(
            key.as_str(),
            vec![MetadataValue::from_link(nodes[index].id.clone())],
            line_start + key.start(),
        );
        entry.is_node_valued = true;
        nodes[parent].metadata.add_entry(entry);
    }
}

/// Copy `*key::` entries onto children and `**key::` entries onto every
/// descendant, skipping nodes that already carry the key.
fn propagate_tags(raw: &[RawNode], root: usize, nodes: &mut [Node]) {
    let mut queue = vec![root];
    let mut head = 0;
    while head < queue.len() {
        let index = queue[head];
        head += 1;

        let tags: Vec<MetadataEntry> = nodes[index]
            .metadata
            .entries()
            .iter()
            .filter(|entry| entry.tag_children || entry.tag_descendants)
            .cloned()
            .collect();

        for entry in tags {
            let targets = if entry.tag_descendants {
                descendants(raw, index)
            } else {
                raw[index].children.clone()
            };
            let mut copy = entry.clone();
            copy.tag_children = false;
            copy.tag_descendants = false;
            for target in targets {
                if !nodes[target].metadata.has_key(&copy.keyname) {
                    nodes[target].metadata.add_entry(copy.clone());
                }
            }
        }

        queue.extend(raw[index].children.iter().copied());
    }
}

fn descendants(raw: &[RawNode], index: usize) -> Vec<usize> {
    let mut found = Vec::new();
    let mut stack: Vec<usize> = raw[index].children.clone();
    while let Some(next) = stack.pop() {
        found.push(next);
        stack.extend(raw[next].children.iter().copied());
    }
    found
}
