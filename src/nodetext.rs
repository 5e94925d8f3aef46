//! Main module for nodetext library functionality

pub mod config;
pub mod dynamic;
pub mod error;
pub mod formats;
pub mod lexing;
pub mod location;
pub mod metadata;
pub mod node;
pub mod parsing;
pub mod project;
pub mod syntax;

pub use config::Settings;
pub use error::{
    CompileError, DirectiveError, FormatError, ParseError, ProjectError, StoreError,
};
pub use formats::{FormatRegistry, View};
pub use lexing::{lex, Symbol, SymbolKind};
pub use metadata::{Metadata, MetadataEntry, MetadataValue, Timestamp};
pub use node::{Node, NodeId};
pub use parsing::{parse_buffer, Buffer};
pub use project::{DiskStore, MemoryStore, ProjectIndex, ProjectListener, SourceStore};
