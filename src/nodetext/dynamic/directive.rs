//! Directive operations and their registry
//!
//! A directive is one pipeline stage of a dynamic definition. Each implements
//! [`DirectiveOp`] and is registered under one or more names in a
//! [`DirectiveRegistry`]. Definitions look names up case-insensitively.

use super::compiler::NodeSource;
use super::definition::DynamicDefinition;
use crate::nodetext::config::Settings;
use crate::nodetext::error::DirectiveError;
use crate::nodetext::node::{Node, NodeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Execution phases. Lower runs first; ties keep declaration order.
pub mod phase {
    pub const CONTROL: u32 = 0;
    pub const QUERY: u32 = 100;
    pub const EXCLUDE: u32 = 105;
    pub const SORT: u32 = 200;
    pub const LIMIT: u32 = 210;
    pub const TEXT: u32 = 300;
    pub const WRAP: u32 = 700;
}

/// State passed from one directive to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    /// Selected node ids, in output order
    pub nodes: Vec<NodeId>,
    /// Rendered output, once a text-producing directive has run
    pub text: Option<String>,
}

/// What a directive did with the accumulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Replace(Accumulator),
    Unchanged,
    /// Stop the pipeline; the accumulator so far is final
    Halt,
}

/// Read-only view a directive runs against
#[derive(Clone, Copy)]
pub struct CompileContext<'a> {
    pub nodes: &'a dyn NodeSource,
    pub definition: &'a DynamicDefinition,
    pub settings: &'a Settings,
}

impl<'a> CompileContext<'a> {
    pub fn new(
        nodes: &'a dyn NodeSource,
        definition: &'a DynamicDefinition,
        settings: &'a Settings,
    ) -> Self {
        CompileContext {
            nodes,
            definition,
            settings,
        }
    }

    /// The node the definition is written in
    pub fn source_node(&self) -> Option<&'a Node> {
        self.nodes.get_node(&self.definition.source_node_id)
    }
}

/// One pipeline stage
pub trait DirectiveOp: fmt::Debug + Send + Sync {
    /// Canonical upper-case name
    fn name(&self) -> &'static str;

    fn phase(&self) -> u32;

    /// Configure the directive from the text between its parentheses
    fn parse_argument_string(&mut self, argument: &str) -> Result<(), DirectiveError>;

    fn dynamic_output(&self, accumulator: &Accumulator, context: &CompileContext) -> Outcome;

    /// Whether this directive renders output text
    fn produces_text(&self) -> bool {
        false
    }

    /// Whether a change to `node` can change this directive's result
    fn depends_on(&self, _node: &Node, _context: &CompileContext) -> bool {
        false
    }
}

/// Builds a fresh, unconfigured directive
pub type DirectiveConstructor = fn() -> Box<dyn DirectiveOp>;

/// Registry of directive constructors keyed by upper-case name
///
/// Built once at startup and handed to the parser. Custom directives are added
/// with [`register`](Self::register).
#[derive(Debug, Clone)]
pub struct DirectiveRegistry {
    constructors: HashMap<String, DirectiveConstructor>,
}

impl DirectiveRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        DirectiveRegistry {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor under `name`
    ///
    /// If a directive with the same name already exists, it will be replaced.
    pub fn register(&mut self, name: &str, constructor: DirectiveConstructor) {
        self.constructors.insert(name.to_uppercase(), constructor);
    }

    /// Check if a directive name exists
    pub fn has(&self, name: &str) -> bool {
        self.constructors.contains_key(&name.to_uppercase())
    }

    /// Construct the directive registered as `name` and configure it with `argument`
    pub fn build(
        &self,
        name: &str,
        argument: &str,
    ) -> Result<Arc<dyn DirectiveOp>, DirectiveError> {
        let constructor = self
            .constructors
            .get(&name.to_uppercase())
            .ok_or_else(|| DirectiveError::UnknownDirective(name.to_string()))?;
        let mut directive = constructor();
        directive.parse_argument_string(argument)?;
        Ok(Arc::from(directive))
    }

    /// List all registered names (sorted)
    pub fn list_directives(&self) -> Vec<String> {
        let mut names: Vec<_> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a registry with the built-in directives
    pub fn with_defaults() -> Self {
        use super::directives::{Count, Exclude, Format, Freeze, Include, Limit, Sort, Title};

        let mut registry = Self::new();
        registry.register("INCLUDE", Include::boxed);
        registry.register("+", Include::boxed);
        registry.register("EXCLUDE", Exclude::boxed);
        registry.register("-", Exclude::boxed);
        registry.register("SORT", Sort::boxed);
        registry.register("LIMIT", Limit::boxed);
        registry.register("FORMAT", Format::boxed);
        registry.register("COUNT", Count::boxed);
        registry.register("TITLE", Title::boxed);
        registry.register("FREEZE", Freeze::boxed);
        registry
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
