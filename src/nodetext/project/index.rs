//! Project index
//!
//! Owns one [`Buffer`] per project file and maps every node id to the file that
//! defines it. [`ProjectIndex::set_buffer_contents`] is the only way text enters
//! the index: the text is parsed in full and either replaces the file's buffer
//! or is rejected, leaving the previous buffer in place.
//!
//! After each change the index recompiles the dynamic definitions the change can
//! affect and writes their output back through the store. Writes re-enter the
//! index like any other change, so compilation repeats until the output settles
//! or `compile.max_passes` is reached.

use super::events::ProjectListener;
use super::store::SourceStore;
use crate::nodetext::config::Settings;
use crate::nodetext::dynamic::{
    process, CompileContext, DirectiveRegistry, DynamicDefinition, NodeSource,
};
use crate::nodetext::error::{CompileError, ProjectError};
use crate::nodetext::node::{Node, NodeId};
use crate::nodetext::parsing::{parse_buffer, Buffer, ParseContext};
use crate::nodetext::syntax;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A definition is addressed by its source node and its index within that node.
type DefinitionKey = (NodeId, usize);

/// Changes not yet seen by the compiler
#[derive(Debug, Default)]
struct Pending {
    files: BTreeSet<PathBuf>,
    ids: BTreeSet<NodeId>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.files.is_empty() && self.ids.is_empty()
    }
}

pub struct ProjectIndex {
    settings: Settings,
    registry: DirectiveRegistry,
    store: Box<dyn SourceStore>,
    buffers: BTreeMap<PathBuf, Buffer>,
    nodes: HashMap<NodeId, PathBuf>,
    errors: Vec<ProjectError>,
    listeners: Vec<Box<dyn ProjectListener>>,
    last_results: HashMap<DefinitionKey, Vec<NodeId>>,
    pending: Pending,
}

impl ProjectIndex {
    pub fn new(store: impl SourceStore + 'static, settings: Settings) -> Self {
        Self::with_registry(store, settings, DirectiveRegistry::with_defaults())
    }

    /// An index whose definitions can use custom directives
    pub fn with_registry(
        store: impl SourceStore + 'static,
        settings: Settings,
        registry: DirectiveRegistry,
    ) -> Self {
        ProjectIndex {
            settings,
            registry,
            store: Box::new(store),
            buffers: BTreeMap::new(),
            nodes: HashMap::new(),
            errors: Vec::new(),
            listeners: Vec::new(),
            last_results: HashMap::new(),
            pending: Pending::default(),
        }
    }

    pub fn add_listener(&mut self, listener: impl ProjectListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &dyn SourceStore {
        self.store.as_ref()
    }

    /// Every recovered error since the last [`clear_errors`](Self::clear_errors)
    pub fn errors(&self) -> &[ProjectError] {
        &self.errors
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn files(&self) -> Vec<&Path> {
        self.buffers.keys().map(PathBuf::as_path).collect()
    }

    pub fn buffer(&self, path: &Path) -> Option<&Buffer> {
        self.buffers.get(path)
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        let path = self.nodes.get(id)?;
        self.buffers.get(path)?.get_node(id)
    }

    /// Read and parse every project file, then compile.
    ///
    /// Only a failure to list the files is returned; per-file problems are
    /// recorded in [`errors`](Self::errors) and the file is left out.
    pub fn load(&mut self) -> Result<(), ProjectError> {
        let files = self.store.list_files(&self.settings.project.extensions)?;
        info!(files = files.len(), "loading project");

        for path in files {
            let result = match self.store.read_text(&path) {
                Ok(text) => self.ingest(&path, &text),
                Err(err) => Err(self.fail(err.into())),
            };
            if let Err(err) = result {
                debug!(file = %path.display(), error = %err, "file left out of project");
            }
        }

        for (node, target) in self.dangling_pointers() {
            warn!(node = %node, target = %target, "pointer to unknown node");
        }
        self.compile();
        Ok(())
    }

    /// Replace the text of `path` and recompile what it affects.
    ///
    /// `path` must already be in the project or carry one of the project's
    /// extensions.
    pub fn set_buffer_contents(&mut self, path: &Path, text: &str) -> Result<(), ProjectError> {
        if !self.is_project_file(path) {
            return Err(self.fail(ProjectError::UnknownFile(path.to_path_buf())));
        }
        self.ingest(path, text)?;
        self.compile();
        Ok(())
    }

    /// Re-read `path` from the store after an outside change.
    ///
    /// A file that can no longer be read is dropped from the index.
    pub fn file_modified(&mut self, path: &Path) -> Result<(), ProjectError> {
        match self.store.read_text(path) {
            Ok(text) => self.set_buffer_contents(path, &text),
            Err(err) => {
                self.remove_buffer(path);
                self.compile();
                Err(self.fail(err.into()))
            }
        }
    }

    /// Move `id` to the end of `destination`'s content, across files if needed.
    pub fn pull_node(&mut self, id: &str, destination: &str) -> Result<(), ProjectError> {
        let node = match self.get_node(id) {
            Some(node) => node.clone(),
            None => return Err(self.fail(CompileError::NodeNotFound(id.to_string()).into())),
        };
        let target = match self.get_node(destination) {
            Some(node) => node.clone(),
            None => {
                return Err(self.fail(CompileError::NodeNotFound(destination.to_string()).into()))
            }
        };
        if node.is_root {
            return Err(self.fail(CompileError::RootNotMovable(node.id).into()));
        }
        if target.id == node.id || self.is_descendant(&target.id, &node.id) {
            let err = CompileError::CircularPull {
                node: node.id,
                destination: target.id,
            };
            return Err(self.fail(err.into()));
        }

        let (Some(from), Some(to)) = (
            self.nodes.get(id).cloned(),
            self.nodes.get(destination).cloned(),
        ) else {
            return Err(self.fail(CompileError::NodeNotFound(id.to_string()).into()));
        };
        let from_text = self.text_of(&from);
        let moved = if node.is_compact {
            format!(
                "{}{}{}",
                syntax::OPENING_WRAPPER,
                &from_text[node.start_position()..node.end_position()],
                syntax::CLOSING_WRAPPER
            )
        } else {
            from_text[node.wrapper_span.clone()].to_string()
        };
        if target.is_compact && moved.contains('\n') {
            let err = CompileError::MultilineIntoCompact {
                node: node.id,
                destination: target.id,
            };
            return Err(self.fail(err.into()));
        }
        let insert_at = target.end_position();
        // A compact node ends with its line, so the block joins that line.
        let place = |text: &mut String| {
            if target.is_compact {
                text.insert_str(insert_at, &format!(" {moved}"));
            } else {
                insert_block(text, insert_at, &moved);
            }
        };

        info!(node = %node.id, destination = %target.id, "pulling node");
        if from == to {
            // The destination is never inside the moved span, so edit back to front.
            let mut text = from_text;
            let removal = node.wrapper_span.clone();
            if insert_at >= removal.end {
                place(&mut text);
                text.replace_range(removal, "");
            } else {
                text.replace_range(removal, "");
                place(&mut text);
            }
            self.write_file(&from, &text)?;
        } else {
            let mut source_text = from_text;
            source_text.replace_range(node.wrapper_span.clone(), "");
            self.write_file(&from, &source_text)?;

            let mut target_text = self.text_of(&to);
            place(&mut target_text);
            self.write_file(&to, &target_text)?;
        }
        self.compile();
        Ok(())
    }

    /// Nodes that point or link to `id`
    pub fn backlinks(&self, id: &str) -> Vec<&Node> {
        self.all_nodes()
            .into_iter()
            .filter(|node| {
                node.pointers.iter().any(|pointer| pointer == id)
                    || node.metadata.entries().iter().any(|entry| {
                        entry
                            .values
                            .iter()
                            .any(|value| value.link.as_deref() == Some(id))
                    })
            })
            .collect()
    }

    /// `(node, target)` for every pointer whose target is not in the project
    pub fn dangling_pointers(&self) -> Vec<(NodeId, NodeId)> {
        self.all_nodes()
            .into_iter()
            .flat_map(|node| {
                node.pointers
                    .iter()
                    .filter(|target| !self.nodes.contains_key(target.as_str()))
                    .map(|target| (node.id.clone(), target.clone()))
            })
            .collect()
    }

    /// Recompile stale definitions until nothing changes or `compile.max_passes`
    /// is reached. Returns the files that were written.
    pub fn compile(&mut self) -> Vec<PathBuf> {
        let mut written: Vec<PathBuf> = Vec::new();
        for pass in 0..self.settings.compile.max_passes {
            if self.pending.is_empty() {
                return written;
            }
            let pending = std::mem::take(&mut self.pending);
            let stale = self.stale_definitions(&pending);
            debug!(pass, stale = stale.len(), "compiling dynamic definitions");

            for key in stale {
                for path in self.run_definition(&key) {
                    if !written.contains(&path) {
                        written.push(path);
                    }
                }
            }
        }
        if !self.pending.is_empty() {
            warn!(
                passes = self.settings.compile.max_passes,
                "dynamic definitions did not settle"
            );
            self.pending = Pending::default();
        }
        written
    }

    fn stale_definitions(&self, pending: &Pending) -> Vec<DefinitionKey> {
        let mut stale = Vec::new();
        for buffer in self.buffers.values() {
            let file_changed = pending.files.contains(&buffer.filename);
            for node in &buffer.nodes {
                for (index, definition) in node.dynamic_definitions.iter().enumerate() {
                    let key = (node.id.clone(), index);
                    if file_changed || self.is_affected(&key, definition, pending) {
                        stale.push(key);
                    }
                }
            }
        }
        stale
    }

    fn is_affected(
        &self,
        key: &DefinitionKey,
        definition: &DynamicDefinition,
        pending: &Pending,
    ) -> bool {
        let selected_before = self
            .last_results
            .get(key)
            .is_some_and(|ids| ids.iter().any(|id| pending.ids.contains(id)));
        if selected_before {
            return true;
        }
        let context = CompileContext::new(self, definition, &self.settings);
        pending
            .ids
            .iter()
            .filter_map(|id| self.get_node(id))
            .any(|node| definition.depends_on(node, &context))
    }

    /// Compile one definition and write its output. Returns the files written.
    fn run_definition(&mut self, key: &DefinitionKey) -> Vec<PathBuf> {
        let Some(source) = self.get_node(&key.0).cloned() else {
            return Vec::new();
        };
        let Some(definition) = source.dynamic_definitions.get(key.1).cloned() else {
            return Vec::new();
        };

        if !definition.has_targets() {
            let err = CompileError::NoTarget(source.id.clone());
            warn!(source = %source.id, error = %err, "skipping dynamic definition");
            self.fail(err.into());
            return Vec::new();
        }

        let targets = definition.resolve_targets(&source);
        let problem = targets
            .iter()
            .find_map(|target| self.check_target(&source, target).err());
        if let Some(err) = problem {
            warn!(source = %source.id, error = %err, "skipping dynamic definition");
            self.fail(err.into());
            return Vec::new();
        }

        let compiled = process(&definition, &*self, &self.settings);
        self.last_results.insert(key.clone(), compiled.selected);
        let Some(output) = compiled.output else {
            return Vec::new();
        };

        let mut written = Vec::new();
        for target in &targets {
            if let Some(path) = self.write_target(&definition, &source, target, &output) {
                written.push(path);
            }
        }
        for file in &definition.target_files {
            if self.write_file_target(file, &output) {
                written.push(file.clone());
            }
        }
        written
    }

    fn check_target(&self, source: &Node, target: &str) -> Result<(), CompileError> {
        let invalid = |reason: &str| CompileError::InvalidTarget {
            source_id: source.id.clone(),
            target: target.to_string(),
            reason: reason.to_string(),
        };
        let Some(node) = self.get_node(target) else {
            return Err(CompileError::TargetNotFound {
                source_id: source.id.clone(),
                target: target.to_string(),
            });
        };
        if node.is_root {
            return Err(invalid("the root node holds the whole file"));
        }
        if node.is_compact {
            return Err(invalid("compact nodes hold a single line"));
        }
        if node.id == source.id && !node.children.is_empty() {
            return Err(invalid("the node has child nodes"));
        }
        if self.is_descendant(&source.id, &node.id) {
            return Err(invalid("the target contains the definition"));
        }
        Ok(())
    }

    /// Splice `output` over the target's content, keeping its id. Returns the
    /// file written, if any.
    fn write_target(
        &mut self,
        definition: &DynamicDefinition,
        source: &Node,
        target: &str,
        output: &str,
    ) -> Option<PathBuf> {
        let path = self.nodes.get(target)?.clone();
        let buffer = self.buffers.get(&path)?;
        let node = buffer.get_node(target)?;

        let mut interior = format!("id{}{}\n{}", syntax::METADATA_ASSIGNER, node.id, output);
        if node.id == source.id {
            if !interior.ends_with('\n') {
                interior.push('\n');
            }
            interior.push_str(&definition.source_text);
        }

        let span = node.start_position()..node.end_position();
        if buffer.contents[span.clone()] == interior {
            return None;
        }
        let mut text = buffer.contents.clone();
        text.replace_range(span, &interior);
        self.write_file(&path, &text).ok()?;
        Some(path)
    }

    fn write_file_target(&mut self, path: &Path, output: &str) -> bool {
        let text = syntax::strip_markup(output);
        if self.store.read_text(path).ok().as_deref() == Some(text.as_str()) {
            return false;
        }
        if self.is_project_file(path) {
            return self.write_file(path, &text).is_ok();
        }
        match self.store.write_text(path, &text) {
            Ok(()) => {
                info!(file = %path.display(), "wrote file target");
                self.notify(|listener| listener.on_file_modified(path));
                true
            }
            Err(err) => {
                self.fail(err.into());
                false
            }
        }
    }

    /// Write `text` through the store and take it into the index.
    fn write_file(&mut self, path: &Path, text: &str) -> Result<(), ProjectError> {
        if let Err(err) = self.store.write_text(path, text) {
            return Err(self.fail(err.into()));
        }
        info!(file = %path.display(), "wrote file");
        self.notify(|listener| listener.on_file_modified(path));
        self.ingest(path, text)
    }

    /// Parse `text` as `path` and swap it in. On any error the previous buffer
    /// is kept, except for duplicate ids, which drop the file.
    fn ingest(&mut self, path: &Path, text: &str) -> Result<(), ProjectError> {
        let buffer = parse_buffer(path, text, &ParseContext::new(&self.settings, &self.registry));
        if let Some(source) = buffer.errors.first() {
            let err = ProjectError::Parse {
                path: path.to_path_buf(),
                source: source.clone(),
            };
            return Err(self.fail(err));
        }

        if let Some((id, existing)) = self.find_duplicate(path, &buffer) {
            self.remove_buffer(path);
            let err = ProjectError::DuplicateId {
                id,
                path: path.to_path_buf(),
                existing,
            };
            return Err(self.fail(err));
        }

        if buffer.healed {
            match self.store.write_text(path, &buffer.contents) {
                Ok(()) => {
                    info!(file = %path.display(), "wrote healed text");
                    self.notify(|listener| listener.on_file_modified(path));
                }
                Err(err) => {
                    self.fail(err.into());
                }
            }
        }
        for (_, err) in &buffer.directive_errors {
            self.record(ProjectError::Directive {
                path: path.to_path_buf(),
                source: err.clone(),
            });
        }

        let removed = self.remove_buffer(path);
        let added: Vec<NodeId> = buffer
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .filter(|id| !removed.contains(id))
            .collect();
        for node in &buffer.nodes {
            self.nodes.insert(node.id.clone(), path.to_path_buf());
            self.pending.ids.insert(node.id.clone());
        }
        self.pending.ids.extend(removed);
        self.pending.files.insert(path.to_path_buf());

        debug!(file = %path.display(), nodes = buffer.nodes.len(), "buffer parsed");
        self.buffers.insert(path.to_path_buf(), buffer);
        self.notify(|listener| listener.on_file_parsed(path));
        for id in &added {
            self.notify(|listener| listener.on_node_added(id));
        }
        Ok(())
    }

    /// First id of `buffer` that repeats within it or is owned by another file
    fn find_duplicate(&self, path: &Path, buffer: &Buffer) -> Option<(NodeId, PathBuf)> {
        let mut seen = HashSet::new();
        for node in &buffer.nodes {
            if !seen.insert(node.id.as_str()) {
                return Some((node.id.clone(), path.to_path_buf()));
            }
            if let Some(owner) = self.nodes.get(&node.id) {
                if owner != path {
                    return Some((node.id.clone(), owner.clone()));
                }
            }
        }
        None
    }

    /// Drop `path` from the index. Returns the ids it defined.
    fn remove_buffer(&mut self, path: &Path) -> Vec<NodeId> {
        let Some(buffer) = self.buffers.remove(path) else {
            return Vec::new();
        };
        let ids: Vec<NodeId> = buffer.nodes.into_iter().map(|node| node.id).collect();
        for id in &ids {
            if self.nodes.get(id).is_some_and(|owner| owner == path) {
                self.nodes.remove(id);
            }
        }
        self.pending.ids.extend(ids.iter().cloned());
        self.pending.files.insert(path.to_path_buf());
        ids
    }

    fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        let mut current = self.get_node(candidate).and_then(|node| node.parent.clone());
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get_node(&id).and_then(|node| node.parent.clone());
        }
        false
    }

    fn is_project_file(&self, path: &Path) -> bool {
        self.buffers.contains_key(path)
            || path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    self.settings
                        .project
                        .extensions
                        .iter()
                        .any(|wanted| wanted.eq_ignore_ascii_case(ext))
                })
    }

    fn text_of(&self, path: &Path) -> String {
        self.buffers
            .get(path)
            .map(|buffer| buffer.contents.clone())
            .unwrap_or_default()
    }

    fn notify(&mut self, event: impl Fn(&mut dyn ProjectListener)) {
        for listener in &mut self.listeners {
            event(listener.as_mut());
        }
    }

    fn record(&mut self, err: ProjectError) {
        if !self.errors.contains(&err) {
            self.errors.push(err);
        }
    }

    /// Log and record `err`, handing it back for the caller to return.
    fn fail(&mut self, err: ProjectError) -> ProjectError {
        warn!(error = %err, "project error");
        self.record(err.clone());
        err
    }
}

impl NodeSource for ProjectIndex {
    fn get_node(&self, id: &str) -> Option<&Node> {
        ProjectIndex::get_node(self, id)
    }

    fn all_nodes(&self) -> Vec<&Node> {
        self.buffers
            .values()
            .flat_map(|buffer| buffer.nodes.iter())
            .collect()
    }
}

/// Insert `block` at `offset` on a line of its own.
fn insert_block(text: &mut String, offset: usize, block: &str) {
    if text[..offset].ends_with('\n') {
        text.insert_str(offset, block);
    } else {
        text.insert_str(offset, &format!("\n{block}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodetext::error::ParseError;
    use crate::nodetext::project::{EventLog, MemoryStore};

    const NOTES: &str = "Notes
{ Dune
status::done
date::<2024-01-10> }
{ Emma
status::done
date::<2024-03-02> }
{ Ulysses
status::open }
{ Recent
[[INCLUDE(status = done) SORT(date) ID(Done)]] }
{ Done }";

    fn project(files: &[(&str, &str)]) -> ProjectIndex {
        let mut store = MemoryStore::new();
        for (path, text) in files {
            store = store.with_file(*path, text);
        }
        let mut index = ProjectIndex::new(store, Settings::default());
        index.load().expect("project to load");
        index
    }

    fn read(index: &ProjectIndex, path: &str) -> String {
        index.store().read_text(Path::new(path)).expect("file to exist")
    }

    #[test]
    fn test_load_compiles_and_writes_back() {
        let index = project(&[("notes.txt", NOTES)]);
        let text = read(&index, "notes.txt");
        assert!(text.ends_with("{id::Done\nEmma | Emma >\nDune | Dune >\n}"));
        assert_eq!(index.get_node("Done").map(|n| n.explicit_id), Some(true));
        assert!(index.errors().is_empty());
    }

    #[test]
    fn test_recompile_is_idempotent() {
        let mut index = project(&[("notes.txt", NOTES)]);
        let first = read(&index, "notes.txt");
        index
            .set_buffer_contents(Path::new("notes.txt"), &first)
            .unwrap();
        assert!(index.compile().is_empty());
        assert_eq!(read(&index, "notes.txt"), first);
    }

    #[test]
    fn test_change_to_selected_node_recompiles() {
        let mut index = project(&[("notes.txt", NOTES)]);
        let text = read(&index, "notes.txt").replace("status::open", "status::done");
        index
            .set_buffer_contents(Path::new("notes.txt"), &text)
            .unwrap();
        let done = index.get_node("Done").expect("target");
        assert!(done.contents().contains("Ulysses | Ulysses >"));
    }

    #[test]
    fn test_listeners_hear_changes() {
        let mut index = ProjectIndex::new(
            MemoryStore::new().with_file("notes.txt", NOTES),
            Settings::default(),
        );
        let log = EventLog::new();
        index.add_listener(log.clone());
        index.load().unwrap();

        let events = log.snapshot();
        assert_eq!(events.first().map(String::as_str), Some("parsed notes.txt"));
        assert!(events.contains(&"added Dune".to_string()));
        assert!(events.contains(&"modified notes.txt".to_string()));
    }

    #[test]
    fn test_duplicate_id_drops_later_file() {
        let index = project(&[("a.txt", "A\n{ Shared }"), ("b.txt", "B\n{ Shared }")]);
        assert!(index.buffer(Path::new("b.txt")).is_none());
        assert_eq!(
            index.get_node("Shared").map(|n| n.filename.clone()),
            Some(PathBuf::from("a.txt"))
        );
        assert!(index.errors().contains(&ProjectError::DuplicateId {
            id: "Shared".into(),
            path: PathBuf::from("b.txt"),
            existing: PathBuf::from("a.txt"),
        }));
    }

    #[test]
    fn test_missing_target_writes_nothing() {
        let text = "Root\n{ Src\n[[INCLUDE(all) ID(Nowhere)]] }";
        let index = project(&[("r.txt", text)]);
        assert_eq!(read(&index, "r.txt"), text);
        assert!(index.errors().contains(&ProjectError::Compile(
            CompileError::TargetNotFound {
                source_id: "Src".into(),
                target: "Nowhere".into(),
            }
        )));
    }

    #[test]
    fn test_definition_without_target_is_reported() {
        let text = "Root\n{ Recent\n[[INCLUDE(tag: status = done) SORT(date) LIMIT(3)]] }\n\
                    { Entry\nstatus::done }";
        let index = project(&[("r.txt", text)]);
        assert_eq!(read(&index, "r.txt"), text);
        assert!(index
            .errors()
            .contains(&ProjectError::Compile(CompileError::NoTarget("Recent".into()))));
    }

    #[test]
    fn test_self_target_keeps_definition() {
        let text = "Root\n{ Digest\n[[INCLUDE(status = pick) ID(@self)]] }\n{ One\nstatus::pick }";
        let index = project(&[("d.txt", text)]);
        assert_eq!(
            read(&index, "d.txt"),
            "Root\n{id::Digest\nOne | One >\n[[INCLUDE(status = pick) ID(@self)]]}\n{ One\nstatus::pick }"
        );
    }

    #[test]
    fn test_file_target_gets_plain_text() {
        let text = "Root\n{ Src\n[[INCLUDE(status = pick) FILE(out.md)]] }\n{ One\nstatus::pick }";
        let index = project(&[("s.txt", text)]);
        assert_eq!(read(&index, "out.md"), "One One\n");
        assert_eq!(read(&index, "s.txt"), text);
    }

    #[test]
    fn test_failed_parse_keeps_previous_buffer() {
        let mut settings = Settings::default();
        settings.parsing.max_healing_attempts = 0;
        let mut index =
            ProjectIndex::new(MemoryStore::new().with_file("a.txt", "A\n{ ok }"), settings);
        index.load().unwrap();

        let err = index
            .set_buffer_contents(Path::new("a.txt"), "A\n{ broken")
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectError::Parse {
                source: ParseError::HealingExhausted { .. },
                ..
            }
        ));
        assert!(index.get_node("ok").is_some());
        assert!(index.get_node("broken").is_none());
    }

    #[test]
    fn test_healed_text_is_written_back() {
        let index = project(&[("a.txt", "A\n{ open")]);
        assert_eq!(read(&index, "a.txt"), "A\n{ open}");
    }

    #[test]
    fn test_pull_node_within_file() {
        let mut index = project(&[("p.txt", "Root\n{ Inbox\n{ Task } }\n{ Done }")]);
        index.pull_node("Task", "Done").unwrap();
        assert_eq!(read(&index, "p.txt"), "Root\n{ Inbox\n }\n{ Done \n{ Task }}");
        assert_eq!(
            index.get_node("Task").and_then(|n| n.parent.clone()),
            Some("Done".to_string())
        );
    }

    #[test]
    fn test_pull_node_across_files() {
        let mut index = project(&[("a.txt", "A\n{ Move me }"), ("b.txt", "B")]);
        index.pull_node("Move me", "B").unwrap();
        assert_eq!(read(&index, "a.txt"), "A\n");
        assert_eq!(read(&index, "b.txt"), "B\n{ Move me }");
        assert_eq!(
            index.get_node("Move me").map(|n| n.filename.clone()),
            Some(PathBuf::from("b.txt"))
        );
    }

    #[test]
    fn test_pull_node_rejections() {
        let text = "Root\n{ Inbox\n{ Task } }";
        let mut index = project(&[("p.txt", text)]);
        assert!(matches!(
            index.pull_node("Inbox", "Task"),
            Err(ProjectError::Compile(CompileError::CircularPull { .. }))
        ));
        assert!(matches!(
            index.pull_node("Root", "Task"),
            Err(ProjectError::Compile(CompileError::RootNotMovable(_)))
        ));
        assert!(matches!(
            index.pull_node("Ghost", "Task"),
            Err(ProjectError::Compile(CompileError::NodeNotFound(_)))
        ));
        assert_eq!(read(&index, "p.txt"), text);
    }

    #[test]
    fn test_pull_node_into_compact_node_joins_its_line() {
        let mut index = project(&[("c.txt", "Root\n• Dest\n{ Task }")]);
        index.pull_node("Task", "Dest").unwrap();
        assert_eq!(read(&index, "c.txt"), "Root\n• Dest { Task }\n");
        assert_eq!(
            index.get_node("Task").and_then(|n| n.parent.clone()),
            Some("Dest".to_string())
        );
    }

    #[test]
    fn test_multiline_node_cannot_join_compact_node() {
        let text = "Root\n• Dest\n{ Task\nstatus::open }";
        let mut index = project(&[("c.txt", text)]);
        assert!(matches!(
            index.pull_node("Task", "Dest"),
            Err(ProjectError::Compile(CompileError::MultilineIntoCompact { .. }))
        ));
        assert_eq!(read(&index, "c.txt"), text);
    }

    #[test]
    fn test_unknown_file_is_refused() {
        let mut index = project(&[("a.txt", "A")]);
        let err = index
            .set_buffer_contents(Path::new("notes.md"), "Notes")
            .unwrap_err();
        assert_eq!(err, ProjectError::UnknownFile(PathBuf::from("notes.md")));
        assert_eq!(index.files(), vec![Path::new("a.txt")]);
    }

    #[test]
    fn test_backlinks_and_dangling_pointers() {
        let index = project(&[(
            "l.txt",
            "Root\n{ Target }\n{ Fan\nsee::| Target > }\n{ Pointer | Target >> }\n{ Lost | Nowhere >> }",
        )]);
        let fans: Vec<&str> = index
            .backlinks("Target")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(fans, vec!["Fan", "Pointer Target"]);
        assert_eq!(
            index.dangling_pointers(),
            vec![("Lost Nowhere".to_string(), "Nowhere".to_string())]
        );
    }
}
