//! Error types
//!
//! Every error here is recoverable at file or node granularity: the project index
//! logs it, records it, and keeps operating on the other buffers.

use std::path::PathBuf;
use thiserror::Error;

/// Structural errors raised while parsing one buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Healing was attempted but the wrapper structure is still unbalanced
    #[error("unbalanced wrappers remain after {attempts} healing attempt(s): {detail}")]
    HealingExhausted { attempts: usize, detail: String },
}

/// Errors raised while reading a directive string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),
    #[error("invalid argument for {directive}: {message}")]
    InvalidArgument { directive: String, message: String },
    #[error("malformed dynamic definition: {0}")]
    Syntax(String),
}

/// Reference and mutation errors raised while compiling dynamic definitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("dynamic definition in '{source_id}' targets missing node '{target}'")]
    TargetNotFound { source_id: String, target: String },
    #[error("dynamic definition in '{source_id}' cannot write to '{target}': {reason}")]
    InvalidTarget {
        source_id: String,
        target: String,
        reason: String,
    },
    #[error("dynamic definition in '{0}' has no target; name one with ID(..) or FILE(..)")]
    NoTarget(String),
    #[error("cannot pull '{node}' into '{destination}': destination is the node or one of its descendants")]
    CircularPull { node: String, destination: String },
    #[error("cannot pull '{node}' into compact node '{destination}': '{node}' spans several lines")]
    MultilineIntoCompact { node: String, destination: String },
    #[error("cannot pull root node '{0}'")]
    RootNotMovable(String),
    #[error("node '{0}' not found")]
    NodeNotFound(String),
}

/// File I/O errors reported by a [`SourceStore`](crate::nodetext::project::SourceStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("file is not valid UTF-8: {0}")]
    Decode(PathBuf),
    #[error("i/o error on {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Errors recorded by the project index, one per affected file or definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{path}: {source}")]
    Parse { path: PathBuf, source: ParseError },
    #[error("{path}: duplicate node id '{id}' (already defined in {existing})")]
    DuplicateId {
        id: String,
        path: PathBuf,
        existing: PathBuf,
    },
    #[error("{path}: {source}")]
    Directive { path: PathBuf, source: DirectiveError },
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("file not in project: {0}")]
    UnknownFile(PathBuf),
}

/// Errors raised while rendering a view of a buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown format '{name}' (available: {available})")]
    UnknownFormat { name: String, available: String },
    #[error("{0} has no node tree: its wrappers could not be balanced")]
    Unparsed(PathBuf),
    #[error("{path} has no node '{id}'")]
    UnknownNode { id: String, path: PathBuf },
    #[error("cannot encode '{id}' as {format}: {message}")]
    Encode {
        format: &'static str,
        id: String,
        message: String,
    },
}
