//! File access for the project index
//!
//! Paths handed to a store are relative to the project root. Text is UTF-8 only;
//! anything else is a [`StoreError::Decode`].

use crate::nodetext::error::StoreError;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub trait SourceStore: Send {
    fn read_text(&self, path: &Path) -> Result<String, StoreError>;

    fn write_text(&mut self, path: &Path, text: &str) -> Result<(), StoreError>;

    /// Every file whose extension is in `extensions`, sorted
    fn list_files(&self, extensions: &[String]) -> Result<Vec<PathBuf>, StoreError>;
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
}

/// A directory on disk. Listing honors `.gitignore` and hidden-file rules.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_error(path: &Path, err: std::io::Error) -> StoreError {
        match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
            _ => StoreError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }
}

impl SourceStore for DiskStore {
    fn read_text(&self, path: &Path) -> Result<String, StoreError> {
        let bytes = fs::read(self.root.join(path)).map_err(|err| Self::io_error(path, err))?;
        String::from_utf8(bytes).map_err(|_| StoreError::Decode(path.to_path_buf()))
    }

    fn write_text(&mut self, path: &Path, text: &str) -> Result<(), StoreError> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|err| Self::io_error(path, err))?;
        }
        fs::write(&full, text).map_err(|err| Self::io_error(path, err))
    }

    fn list_files(&self, extensions: &[String]) -> Result<Vec<PathBuf>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::NotFound(self.root.clone()));
        }
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(true)
            .follow_links(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                continue;
            }
            let path = entry.into_path();
            if !has_extension(&path, extensions) {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.root) {
                files.push(relative.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

/// In-memory files, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: &str) -> Self {
        self.files.insert(path.into(), text.as_bytes().to_vec());
        self
    }

    pub fn insert_bytes(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    pub fn remove(&mut self, path: &Path) {
        self.files.remove(path);
    }
}

impl SourceStore for MemoryStore {
    fn read_text(&self, path: &Path) -> Result<String, StoreError> {
        let bytes = self
            .files
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        String::from_utf8(bytes.clone()).map_err(|_| StoreError::Decode(path.to_path_buf()))
    }

    fn write_text(&mut self, path: &Path, text: &str) -> Result<(), StoreError> {
        self.files
            .insert(path.to_path_buf(), text.as_bytes().to_vec());
        Ok(())
    }

    fn list_files(&self, extensions: &[String]) -> Result<Vec<PathBuf>, StoreError> {
        Ok(self
            .files
            .keys()
            .filter(|path| has_extension(path, extensions))
            .cloned()
            .collect())
    }
}
