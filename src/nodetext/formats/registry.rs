//! Named formatters
//!
//! Formatters are stored under their own name. Rendering looks the format up,
//! builds a [`View`] of the whole buffer or of one node, and hands it over.

use super::view::View;
use crate::nodetext::error::FormatError;
use crate::nodetext::parsing::Buffer;
use std::collections::BTreeMap;

/// Turns a view of a buffer into text
pub trait Formatter: Send + Sync {
    fn name(&self) -> &'static str;

    /// One line for `list-formats`
    fn summary(&self) -> &'static str;

    fn render(&self, view: &View) -> Result<String, FormatError>;
}

pub struct FormatRegistry {
    formatters: BTreeMap<&'static str, Box<dyn Formatter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formatters: BTreeMap::new(),
        }
    }

    /// Add `formatter`, replacing any formatter registered under the same name.
    pub fn register(&mut self, formatter: impl Formatter + 'static) {
        self.formatters.insert(formatter.name(), Box::new(formatter));
    }

    /// `(name, summary)` of every formatter, by name
    pub fn formats(&self) -> Vec<(&'static str, &'static str)> {
        self.formatters
            .values()
            .map(|formatter| (formatter.name(), formatter.summary()))
            .collect()
    }

    /// Render `buffer` in `format`, starting at node `id` or at the root.
    pub fn render(
        &self,
        buffer: &Buffer,
        format: &str,
        id: Option<&str>,
    ) -> Result<String, FormatError> {
        let formatter = self
            .formatters
            .get(format)
            .ok_or_else(|| FormatError::UnknownFormat {
                name: format.to_string(),
                available: self.formatters.keys().copied().collect::<Vec<_>>().join(", "),
            })?;
        let view = match id {
            Some(id) => View::of_node(buffer, id)?,
            None => View::of_buffer(buffer)?,
        };
        formatter.render(&view)
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(super::TreevizFormatter);
        registry.register(super::JsonFormatter);
        registry.register(super::YamlFormatter);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
