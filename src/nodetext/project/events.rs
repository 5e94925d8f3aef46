//! Change notifications
//!
//! Listeners are told about structural changes after they happen. Nothing the
//! index does depends on what a listener does with them.

use std::path::Path;

pub trait ProjectListener: Send {
    /// A file was (re-)parsed and its nodes replaced
    fn on_file_parsed(&mut self, _path: &Path) {}

    /// A node id appeared that the index did not know before
    fn on_node_added(&mut self, _id: &str) {}

    /// The index wrote new text for a file
    fn on_file_modified(&mut self, _path: &Path) {}
}

/// Records every event as a line of text
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProjectListener for EventLog {
    fn on_file_parsed(&mut self, path: &Path) {
        self.push(format!("parsed {}", path.display()));
    }

    fn on_node_added(&mut self, id: &str) {
        self.push(format!("added {id}"));
    }

    fn on_file_modified(&mut self, path: &Path) {
        self.push(format!("modified {}", path.display()));
    }
}
