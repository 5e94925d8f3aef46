//! JSON and YAML records of a subtree
//!
//! Each node becomes a record with its id, title, metadata, pointers, the text
//! of its dynamic definitions and its children, nested the way the nodes are.

use super::registry::Formatter;
use super::view::View;
use crate::nodetext::error::FormatError;
use crate::nodetext::metadata::Metadata;
use crate::nodetext::node::Node;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct NodeRecord<'a> {
    id: &'a str,
    title: &'a str,
    compact: bool,
    metadata: &'a Metadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pointers: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    definitions: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeRecord<'a>>,
}

fn record<'a>(view: &View<'a>, node: &'a Node) -> NodeRecord<'a> {
    NodeRecord {
        id: &node.id,
        title: &node.title,
        compact: node.is_compact,
        metadata: &node.metadata,
        pointers: node.pointers.iter().map(String::as_str).collect(),
        definitions: node
            .dynamic_definitions
            .iter()
            .map(|definition| definition.source_text.as_str())
            .collect(),
        children: view
            .children(node)
            .into_iter()
            .map(|child| record(view, child))
            .collect(),
    }
}

fn encode_error(format: &'static str, view: &View, message: String) -> FormatError {
    FormatError::Encode {
        format,
        id: view.top().id.clone(),
        message,
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn summary(&self) -> &'static str {
        "Nested node records as JSON"
    }

    fn render(&self, view: &View) -> Result<String, FormatError> {
        serde_json::to_string_pretty(&record(view, view.top()))
            .map_err(|err| encode_error("json", view, err.to_string()))
    }
}

pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn summary(&self) -> &'static str {
        "Nested node records as YAML"
    }

    fn render(&self, view: &View) -> Result<String, FormatError> {
        serde_yaml::to_string(&record(view, view.top()))
            .map_err(|err| encode_error("yaml", view, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodetext::parsing::{parse_with_defaults, Buffer};
    use std::path::Path;

    fn buffer() -> Buffer {
        parse_with_defaults(
            Path::new("s.txt"),
            "Root\n{ Dune\ngenre::sf\n{ Notes } }\n{ Emma >> Dune }",
        )
    }

    #[test]
    fn test_json_nests_children() {
        let buffer = buffer();
        let json = JsonFormatter
            .render(&View::of_buffer(&buffer).unwrap())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], "Root");
        assert_eq!(value["children"][0]["id"], "Dune");
        assert_eq!(value["children"][0]["children"][0]["id"], "Notes");
        assert_eq!(value["children"][1]["pointers"][0], "Dune");
        assert!(value["children"][0]["children"][0].get("children").is_none());
    }

    #[test]
    fn test_yaml_of_one_node() {
        let buffer = buffer();
        let yaml = YamlFormatter
            .render(&View::of_node(&buffer, "Dune").unwrap())
            .unwrap();
        assert!(yaml.starts_with("id: Dune\n"));
        assert!(yaml.contains("keyname: genre"));
        assert!(!yaml.contains("Emma"));
    }
}
