//! The project: every buffer of one directory
//!
//! [`ProjectIndex`] owns the parsed buffers, resolves node ids across files and
//! keeps dynamic definitions compiled. Files come from a [`SourceStore`];
//! interested parties subscribe through [`ProjectListener`].

pub mod events;
pub mod index;
pub mod store;

pub use events::{EventLog, ProjectListener};
pub use index::ProjectIndex;
pub use store::{DiskStore, MemoryStore, SourceStore};
