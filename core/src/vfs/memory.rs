use super::{normalize, VfsError, VirtualFs};
use std::collections::HashMap;

/// In-memory file tree keyed by normalised absolute path
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: HashMap<String, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_file(mut self, path: &str, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    pub fn insert(&mut self, path: &str, source: impl Into<String>) {
        self.files.insert(normalize(path), source.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: AsRef<str>, S: Into<String>> FromIterator<(P, S)> for MemoryFs {
    fn from_iter<I: IntoIterator<Item = (P, S)>>(iter: I) -> Self {
        let mut fs = MemoryFs::new();
        for (path, source) in iter {
            fs.insert(path.as_ref(), source);
        }
        fs
    }
}

impl VirtualFs for MemoryFs {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }

    fn read_text(&self, path: &str) -> Result<String, VfsError> {
        let path = normalize(path);
        self.files
            .get(&path)
            .cloned()
            .ok_or(VfsError::NotFound(path))
    }
}
