//! Treeviz formatter for subtrees
//!
//! One line per node, with the nesting drawn as a tree:
//!
//! ```text
//! └─ ⧉ Reading list
//!   ├─ § Dune [[1]]
//!   │ └─ § Notes
//!   └─ • Emma >> Austen
//! ```
//!
//! Icons: root `⧉`, wrapped node `§`, compact node `•`. Titles are truncated to
//! 30 characters; `[[n]]` counts dynamic definitions and `>>` lists pointers.

use super::registry::Formatter;
use super::view::View;
use crate::nodetext::error::FormatError;
use crate::nodetext::node::Node;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn icon(node: &Node) -> &'static str {
    if node.is_root {
        "⧉"
    } else if node.is_compact {
        "•"
    } else {
        "§"
    }
}

fn label(node: &Node) -> String {
    let mut label = truncate(&node.title, 30);
    if !node.dynamic_definitions.is_empty() {
        label.push_str(&format!(" [[{}]]", node.dynamic_definitions.len()));
    }
    if !node.pointers.is_empty() {
        label.push_str(&format!(" >> {}", node.pointers.join(", ")));
    }
    label
}

fn append_node(result: &mut String, view: &View, node: &Node, prefix: &str, is_last: bool) {
    let connector = if is_last { "└─" } else { "├─" };
    result.push_str(&format!("{}{} {} {}\n", prefix, connector, icon(node), label(node)));

    let new_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    let children = view.children(node);
    for (i, child) in children.iter().enumerate() {
        append_node(result, view, child, &new_prefix, i == children.len() - 1);
    }
}

pub struct TreevizFormatter;

impl Formatter for TreevizFormatter {
    fn name(&self) -> &'static str {
        "treeviz"
    }

    fn summary(&self) -> &'static str {
        "One line per node, drawn as a tree"
    }

    fn render(&self, view: &View) -> Result<String, FormatError> {
        let mut result = String::new();
        append_node(&mut result, view, view.top(), "", true);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodetext::parsing::{parse_with_defaults, Buffer};
    use std::path::Path;

    fn render(buffer: &Buffer) -> String {
        TreevizFormatter
            .render(&View::of_buffer(buffer).unwrap())
            .unwrap()
    }

    #[test]
    fn test_tree_shape() {
        let buffer = parse_with_defaults(
            Path::new("t.txt"),
            "Root\n{ Alpha\n{ Inner } }\n• Bullet | Alpha >>",
        );
        assert_eq!(
            render(&buffer),
            "└─ ⧉ Root\n  ├─ § Alpha\n  │ └─ § Inner\n  └─ • Bullet Alpha >> Alpha\n"
        );
    }

    #[test]
    fn test_subtree_starts_with_its_node() {
        let text = "Root\n{ Alpha\n{ Inner } }\n{ Beta }";
        let buffer = parse_with_defaults(Path::new("t.txt"), text);
        let view = View::of_node(&buffer, "Alpha").unwrap();
        assert_eq!(
            TreevizFormatter.render(&view).unwrap(),
            "└─ § Alpha\n  └─ § Inner\n"
        );
    }

    #[test]
    fn test_long_titles_and_definitions() {
        let title = "x".repeat(40);
        let text = format!("Root\n{{ {title}\n[[INCLUDE(all) ID(Other)]] }}");
        let buffer = parse_with_defaults(Path::new("t.txt"), &text);
        let expected = format!("└─ ⧉ Root\n  └─ § {}... [[1]]\n", "x".repeat(30));
        assert_eq!(render(&buffer), expected);
    }

    #[test]
    fn test_unparsed_buffer_has_no_view() {
        let mut settings = crate::nodetext::Settings::default();
        settings.parsing.max_healing_attempts = 0;
        let registry = crate::nodetext::dynamic::DirectiveRegistry::with_defaults();
        let context = crate::nodetext::parsing::ParseContext::new(&settings, &registry);
        let buffer = crate::nodetext::parse_buffer(Path::new("t.txt"), "{", &context);
        assert_eq!(
            View::of_buffer(&buffer).unwrap_err(),
            FormatError::Unparsed(Path::new("t.txt").to_path_buf())
        );
    }
}
