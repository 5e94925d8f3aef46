//! Rendering node subtrees
//!
//! A [`View`] is one node of a parsed buffer with everything nested under it,
//! either the whole buffer from its root or the subtree of a single node. The
//! formatters in the [`FormatRegistry`] turn a view into text:
//!
//! - treeviz: one line per node, drawn as a tree
//! - json / yaml: ids, titles, metadata, pointers and children as nested records

pub mod registry;
pub mod serialized;
pub mod treeviz;
pub mod view;

pub use crate::nodetext::error::FormatError;
pub use registry::{FormatRegistry, Formatter};
pub use serialized::{JsonFormatter, YamlFormatter};
pub use treeviz::TreevizFormatter;
pub use view::View;
