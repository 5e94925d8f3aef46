//! The parsed unit
//!
//! Nodes are built exclusively by the buffer parser. A node does not own its
//! relatives: `parent`, `children` and `pointers` are ids resolved through the
//! project index. Every node is rebuilt when its buffer is re-parsed.

use crate::nodetext::config::ParsingSettings;
use crate::nodetext::dynamic::DynamicDefinition;
use crate::nodetext::metadata::{Metadata, MetadataEntry, MetadataValue};
use crate::nodetext::syntax;
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Stable node identity
pub type NodeId = String;

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub filename: PathBuf,
    /// Own-content ranges, excluding wrappers and the ranges of inline descendants
    pub ranges: Vec<Range<usize>>,
    pub nested_depth: usize,
    pub is_root: bool,
    pub is_compact: bool,
    /// True when the own content is empty or whitespace
    pub blank: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub pointers: Vec<NodeId>,
    pub metadata: Metadata,
    pub dynamic_definitions: Vec<DynamicDefinition>,
    pub title: String,
    /// True when the id came from an `id::` entry rather than the title
    pub explicit_id: bool,
    /// Byte span including the wrappers, or the bullet prefix of a compact node
    pub wrapper_span: Range<usize>,
    contents: String,
}

impl Node {
    pub(crate) fn new(
        filename: &Path,
        ranges: Vec<Range<usize>>,
        contents: String,
        nested_depth: usize,
    ) -> Self {
        Node {
            id: String::new(),
            filename: filename.to_path_buf(),
            blank: contents.trim().is_empty(),
            ranges,
            nested_depth,
            is_root: false,
            is_compact: false,
            parent: None,
            children: Vec::new(),
            pointers: Vec::new(),
            metadata: Metadata::new(),
            dynamic_definitions: Vec::new(),
            title: String::new(),
            explicit_id: false,
            wrapper_span: 0..0,
            contents,
        }
    }

    pub fn start_position(&self) -> usize {
        self.ranges.first().map(|r| r.start).unwrap_or(0)
    }

    pub fn end_position(&self) -> usize {
        self.ranges.last().map(|r| r.end).unwrap_or(0)
    }

    /// The node's own content: the concatenation of its ranges
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Own content with metadata, dynamic definitions and link markers removed
    pub fn plain_contents(&self) -> String {
        syntax::strip_markup(&self.contents).trim().to_string()
    }

    pub fn link(&self) -> String {
        syntax::link_to(&self.id)
    }

    /// Whether `offset` falls inside one of this node's own ranges
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.ranges
            .iter()
            .any(|r| r.contains(&offset) || (r.start == offset && r.is_empty()))
    }

    /// Resolve the title and id, and record the title as a synthetic entry.
    ///
    /// The title is the explicit `title` entry, else the first non-blank line of
    /// `title_source` with markup stripped, truncated to `title_length` characters.
    /// The id is the explicit `id` entry, else the title; untitled nodes get a
    /// positional id.
    pub(crate) fn resolve_identity(&mut self, settings: &ParsingSettings, title_source: &str) {
        let explicit_title = self.metadata.get_first_value("title", false);
        let title = match explicit_title {
            Some(title) => title,
            None => {
                let title = first_line_title(title_source, settings.title_length);
                let position = self.start_position();
                self.metadata.add_entry(MetadataEntry::new(
                    "title",
                    vec![MetadataValue::from_text(title.clone())],
                    position,
                ));
                title
            }
        };

        match self.metadata.get_first_value("id", false) {
            Some(id) => {
                self.id = id;
                self.explicit_id = true;
            }
            None if title == syntax::UNTITLED => {
                self.id = format!(
                    "{} {}:{}",
                    syntax::UNTITLED,
                    self.filename.display(),
                    self.start_position()
                );
            }
            None => self.id = title.clone(),
        }
        self.title = title;
    }
}

fn first_line_title(text: &str, title_length: usize) -> String {
    let stripped = syntax::strip_markup(text);
    let stripped = syntax::mask(&stripped, &syntax::EMBEDDED_REGION);
    let line = stripped
        .lines()
        .map(|line| line.trim().trim_start_matches(syntax::BULLET).trim())
        .find(|line| !line.is_empty());

    match line {
        Some(line) => line.chars().take(title_length).collect::<String>().trim().to_string(),
        None => syntax::UNTITLED.to_string(),
    }
}
