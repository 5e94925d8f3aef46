//! `[[ ... ]]` dynamic definitions
//!
//! Definition-level directives (`TARGET`/`ID`/`>`, `FILE`, `SHOW`,
//! `SPACES`/`INDENT`) configure where and how output is written. Every other
//! call is looked up in the [`DirectiveRegistry`] and becomes a pipeline operation.

use super::directive::{CompileContext, DirectiveOp, DirectiveRegistry};
use super::grammar::parse_calls;
use crate::nodetext::config::Settings;
use crate::nodetext::error::DirectiveError;
use crate::nodetext::node::{Node, NodeId};
use crate::nodetext::syntax;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct DynamicDefinition {
    pub source_node_id: NodeId,
    pub target_ids: Vec<NodeId>,
    /// `@self` and `@parent`, resolved against the source node at compile time
    pub target_virtual_targets: Vec<String>,
    pub target_files: Vec<PathBuf>,
    #[serde(skip)]
    pub operations: Vec<Arc<dyn DirectiveOp>>,
    pub spaces: usize,
    pub show_template: Option<String>,
    /// The full `[[ ... ]]` text as written
    pub source_text: String,
    /// Buffer offset of the opening `[[`
    pub position: usize,
}

impl DynamicDefinition {
    /// Read a definition from the text between `[[` and `]]`.
    pub fn parse(
        parameters: &str,
        source_text: &str,
        source_node_id: &str,
        position: usize,
        registry: &DirectiveRegistry,
        settings: &Settings,
    ) -> Result<DynamicDefinition, DirectiveError> {
        let mut definition = DynamicDefinition {
            source_node_id: source_node_id.to_string(),
            target_ids: Vec::new(),
            target_virtual_targets: Vec::new(),
            target_files: Vec::new(),
            operations: Vec::new(),
            spaces: settings.compile.default_spaces,
            show_template: None,
            source_text: source_text.to_string(),
            position,
        };

        for call in parse_calls(parameters)? {
            let argument = call.argument.as_str();
            match call.name.to_uppercase().as_str() {
                "TARGET" | "ID" | ">" => definition.add_targets(&call.name, argument)?,
                "FILE" => {
                    let path = argument.trim();
                    if path.is_empty() {
                        return Err(invalid("FILE", "a path is required"));
                    }
                    definition.target_files.push(PathBuf::from(path));
                }
                "SHOW" => definition.show_template = Some(unescape(argument)),
                "SPACES" | "INDENT" => {
                    definition.spaces = argument
                        .trim()
                        .parse()
                        .map_err(|_| invalid(&call.name, "expected a number of spaces"))?;
                }
                _ => definition
                    .operations
                    .push(registry.build(&call.name, argument)?),
            }
        }
        Ok(definition)
    }

    fn add_targets(&mut self, directive: &str, argument: &str) -> Result<(), DirectiveError> {
        for target in argument.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if target.starts_with('@') {
                let name = target.to_lowercase();
                if name != "@self" && name != "@parent" {
                    return Err(invalid(directive, &format!("unknown virtual target {target}")));
                }
                self.target_virtual_targets.push(name);
                continue;
            }
            let id = syntax::LINK_VALUE
                .captures(target)
                .map(|caps| caps[1].trim().to_string())
                .unwrap_or_else(|| target.to_string());
            self.target_ids.push(id);
        }
        Ok(())
    }

    /// Node ids this definition writes to, with virtual targets resolved
    pub fn resolve_targets(&self, source: &Node) -> Vec<NodeId> {
        let mut targets = self.target_ids.clone();
        for virtual_target in &self.target_virtual_targets {
            let resolved = match virtual_target.as_str() {
                "@self" => Some(source.id.clone()),
                "@parent" => source.parent.clone(),
                _ => None,
            };
            if let Some(id) = resolved {
                if !targets.contains(&id) {
                    targets.push(id);
                }
            }
        }
        targets
    }

    pub fn has_targets(&self) -> bool {
        !self.target_ids.is_empty()
            || !self.target_virtual_targets.is_empty()
            || !self.target_files.is_empty()
    }

    /// Whether a change to `node` can change this definition's output
    pub fn depends_on(&self, node: &Node, context: &CompileContext) -> bool {
        self.operations
            .iter()
            .any(|operation| operation.depends_on(node, context))
    }

    pub fn operation_names(&self) -> Vec<&'static str> {
        self.operations.iter().map(|op| op.name()).collect()
    }
}

fn invalid(directive: &str, message: &str) -> DirectiveError {
    DirectiveError::InvalidArgument {
        directive: directive.to_uppercase(),
        message: message.to_string(),
    }
}

/// Turn `\n` and `\t` escapes in a template into the characters they name.
pub(crate) fn unescape(template: &str) -> String {
    template.replace("\\n", "\n").replace("\\t", "\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parameters: &str) -> Result<DynamicDefinition, DirectiveError> {
        DynamicDefinition::parse(
            parameters,
            &format!("[[{parameters}]]"),
            "Source",
            0,
            &DirectiveRegistry::with_defaults(),
            &Settings::default(),
        )
    }

    #[test]
    fn test_targets_and_operations() {
        let definition =
            parse("ID(| Results >) INCLUDE(status = done) SORT(date) LIMIT(3)").unwrap();
        assert_eq!(definition.target_ids, vec!["Results".to_string()]);
        assert_eq!(definition.operation_names(), vec!["INCLUDE", "SORT", "LIMIT"]);
        assert_eq!(definition.source_node_id, "Source");
    }

    #[test]
    fn test_virtual_targets_and_files() {
        let definition = parse(">(@self) FILE(out/list.txt) +(all)").unwrap();
        assert_eq!(definition.target_virtual_targets, vec!["@self".to_string()]);
        assert_eq!(definition.target_files, vec![PathBuf::from("out/list.txt")]);
        assert!(definition.has_targets());
    }

    #[test]
    fn test_show_and_spaces() {
        let definition = parse("SHOW($title\\n) SPACES(4)").unwrap();
        assert_eq!(definition.show_template.as_deref(), Some("$title\n"));
        assert_eq!(definition.spaces, 4);
    }

    #[test]
    fn test_show_keeps_edge_spaces_while_paths_are_trimmed() {
        let definition = parse("SHOW( $title ) FILE( out.txt ) SPACES( 2 )").unwrap();
        assert_eq!(definition.show_template.as_deref(), Some(" $title "));
        assert_eq!(definition.target_files, vec![PathBuf::from("out.txt")]);
        assert_eq!(definition.spaces, 2);
    }

    #[test]
    fn test_bad_spaces() {
        assert!(matches!(
            parse("INDENT(wide)"),
            Err(DirectiveError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_unknown_virtual_target() {
        assert!(parse("TARGET(@cousin)").is_err());
    }

    #[test]
    fn test_unknown_directive_fails_whole_definition() {
        assert_eq!(
            parse("INCLUDE(all) BOGUS(1)").unwrap_err(),
            DirectiveError::UnknownDirective("BOGUS".into())
        );
    }
}
