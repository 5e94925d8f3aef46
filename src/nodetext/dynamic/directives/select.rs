//! INCLUDE and EXCLUDE

use crate::nodetext::dynamic::directive::{phase, Accumulator, CompileContext, DirectiveOp, Outcome};
use crate::nodetext::dynamic::query::Query;
use crate::nodetext::error::DirectiveError;
use crate::nodetext::node::{Node, NodeId};

fn parse_query(directive: &str, argument: &str) -> Result<Query, DirectiveError> {
    Query::parse(argument).map_err(|message| DirectiveError::InvalidArgument {
        directive: directive.to_string(),
        message,
    })
}

/// Every node matching `query`, in project order
fn select(query: &Query, context: &CompileContext) -> Vec<NodeId> {
    let source = context.source_node();
    let parsing = &context.settings.parsing;
    context
        .nodes
        .all_nodes()
        .into_iter()
        .filter(|node| query.matches(node, source, parsing))
        .map(|node| node.id.clone())
        .collect()
}

/// Adds matching nodes. Several INCLUDEs union their results.
///
/// The definition's targets never match, and its own node only when `@self` is
/// asked for, so generated output cannot feed on itself.
#[derive(Debug, Clone, Default)]
pub struct Include {
    query: Query,
}

impl Include {
    pub fn boxed() -> Box<dyn DirectiveOp> {
        Box::<Include>::default()
    }
}

impl DirectiveOp for Include {
    fn name(&self) -> &'static str {
        "INCLUDE"
    }

    fn phase(&self) -> u32 {
        phase::QUERY
    }

    fn parse_argument_string(&mut self, argument: &str) -> Result<(), DirectiveError> {
        self.query = parse_query("INCLUDE", argument)?;
        Ok(())
    }

    fn dynamic_output(&self, accumulator: &Accumulator, context: &CompileContext) -> Outcome {
        let definition = context.definition;
        let targets = context
            .source_node()
            .map(|source| definition.resolve_targets(source))
            .unwrap_or_else(|| definition.target_ids.clone());

        let mut nodes = accumulator.nodes.clone();
        for id in select(&self.query, context) {
            if targets.contains(&id) || nodes.contains(&id) {
                continue;
            }
            if id == definition.source_node_id && !self.query.names_self() {
                continue;
            }
            nodes.push(id);
        }
        Outcome::Replace(Accumulator {
            nodes,
            text: accumulator.text.clone(),
        })
    }

    fn depends_on(&self, node: &Node, context: &CompileContext) -> bool {
        self.query.concerns(node, context.source_node())
    }
}

/// Removes matching nodes from the selection
#[derive(Debug, Clone, Default)]
pub struct Exclude {
    query: Query,
}

impl Exclude {
    pub fn boxed() -> Box<dyn DirectiveOp> {
        Box::<Exclude>::default()
    }
}

impl DirectiveOp for Exclude {
    fn name(&self) -> &'static str {
        "EXCLUDE"
    }

    fn phase(&self) -> u32 {
        phase::EXCLUDE
    }

    fn parse_argument_string(&mut self, argument: &str) -> Result<(), DirectiveError> {
        self.query = parse_query("EXCLUDE", argument)?;
        Ok(())
    }

    fn dynamic_output(&self, accumulator: &Accumulator, context: &CompileContext) -> Outcome {
        if accumulator.nodes.is_empty() {
            return Outcome::Unchanged;
        }
        let excluded = select(&self.query, context);
        Outcome::Replace(Accumulator {
            nodes: accumulator
                .nodes
                .iter()
                .filter(|id| !excluded.contains(id))
                .cloned()
                .collect(),
            text: accumulator.text.clone(),
        })
    }

    fn depends_on(&self, node: &Node, context: &CompileContext) -> bool {
        self.query.concerns(node, context.source_node())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodetext::dynamic::directives::testing::Fixture;

    const TEXT: &str = "Board
{ Alpha
status::done }
{ Beta
status::open }
{ Gamma
status::done
owner::ana }
{ Results }";

    fn run(parameters: &str) -> Vec<String> {
        let fixture = Fixture::new(TEXT, "Board", parameters);
        let context = fixture.context();
        let mut accumulator = Accumulator::default();
        for op in &fixture.definition.operations {
            if let Outcome::Replace(next) = op.dynamic_output(&accumulator, &context) {
                accumulator = next;
            }
        }
        accumulator.nodes
    }

    #[test]
    fn test_include_matches_in_document_order() {
        assert_eq!(run("INCLUDE(status = done)"), vec!["Alpha", "Gamma"]);
    }

    #[test]
    fn test_includes_union() {
        assert_eq!(
            run("INCLUDE(status = open) INCLUDE(owner = ana)"),
            vec!["Beta", "Gamma"]
        );
    }

    #[test]
    fn test_exclude_removes() {
        assert_eq!(run("INCLUDE(status) EXCLUDE(owner = ana)"), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_targets_and_source_are_skipped() {
        assert_eq!(
            run("ID(Results) INCLUDE(all)"),
            vec!["Alpha", "Beta", "Gamma"]
        );
    }

    #[test]
    fn test_self_only_when_named() {
        assert_eq!(run("INCLUDE(@self)"), vec!["Board"]);
    }

    #[test]
    fn test_children_of_source() {
        assert_eq!(run("INCLUDE(@children) EXCLUDE(title = results)").len(), 3);
    }

    #[test]
    fn test_depends_on_keys() {
        let fixture = Fixture::new(TEXT, "Board", "INCLUDE(owner = ana)");
        let context = fixture.context();
        let op = &fixture.definition.operations[0];
        assert!(op.depends_on(fixture.buffer.get_node("Gamma").unwrap(), &context));
        assert!(!op.depends_on(fixture.buffer.get_node("Alpha").unwrap(), &context));
    }
}
