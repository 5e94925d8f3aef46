//! Dynamic definitions
//!
//! A dynamic definition is a `[[ ... ]]` block inside a node's text. It names one
//! or more targets (nodes or files) and a pipeline of directives whose output
//! replaces the targets' content:
//!
//! ```text
//! [[ ID(| Recent >) INCLUDE(status = done) SORT(date) LIMIT(3) SHOW($title $link\n) ]]
//! ```
//!
//! [`definition`] reads the block, [`grammar`] splits it into calls,
//! [`directive`] holds the operation trait and registry, [`directives`] the built-in
//! operations, [`query`] the selection criteria and [`compiler`] runs the pipeline.

pub mod compiler;
pub mod definition;
pub mod directive;
pub mod directives;
pub mod grammar;
pub mod query;

pub use compiler::{process, Compiled, NodeSource};
pub use definition::DynamicDefinition;
pub use directive::{
    phase, Accumulator, CompileContext, DirectiveConstructor, DirectiveOp, DirectiveRegistry,
    Outcome,
};
