#![allow(missing_docs, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use anyfs::{Backend, EntryKind, FsError, FsPath, Node, PosixPath, Stat};

/// What the in-memory tree holds at one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemEntry {
    Dir,
    File(Bytes),
}

#[derive(Debug, Default)]
struct MemState {
    entries: Mutex<BTreeMap<PosixPath, MemEntry>>,
    hydrations: AtomicUsize,
}

/// An in-memory tree rooted at `/`, counting every hydration.
///
/// Clones share the tree, so a test can keep one handle to mutate the tree
/// and read the counter while the filesystem owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<MemState>,
}

impl MemoryBackend {
    /// A tree with only the root directory.
    pub fn new() -> Self {
        let backend = Self::default();
        backend.put(PosixPath::root(), MemEntry::Dir);
        backend
    }

    /// A tree with `/a/`, `/a/b.txt`, `/a/c/` and `/a/c/d.txt`.
    pub fn sample() -> Self {
        Self::new()
            .with_dir("/a")
            .with_file("/a/b.txt", "bee")
            .with_dir("/a/c")
            .with_file("/a/c/d.txt", "dee")
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.put(PosixPath::parse(path), MemEntry::Dir);
        self
    }

    pub fn with_file(self, path: &str, content: impl Into<Bytes>) -> Self {
        self.put(PosixPath::parse(path), MemEntry::File(content.into()));
        self
    }

    pub fn put(&self, path: PosixPath, entry: MemEntry) {
        self.state.entries.lock().unwrap().insert(path, entry);
    }

    pub fn remove(&self, path: &str) {
        self.state
            .entries
            .lock()
            .unwrap()
            .remove(&PosixPath::parse(path));
    }

    /// Number of hydrations performed so far.
    pub fn hydrations(&self) -> usize {
        self.state.hydrations.load(Ordering::SeqCst)
    }
}

impl Backend for MemoryBackend {
    type Path = PosixPath;
    type Meta = MemEntry;

    async fn hydrate(&self, path: &PosixPath) -> Result<Option<MemEntry>, FsError> {
        self.state.hydrations.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.entries.lock().unwrap().get(path).cloned())
    }

    fn is_dir(&self, meta: &MemEntry) -> bool {
        matches!(meta, MemEntry::Dir)
    }

    fn is_file(&self, meta: &MemEntry) -> bool {
        matches!(meta, MemEntry::File(_))
    }

    async fn list(&self, node: &Node<Self>) -> Result<Vec<String>, FsError> {
        let entries = self.state.entries.lock().unwrap();
        Ok(entries
            .keys()
            .filter(|path| path.parent().as_ref() == Some(node.path()))
            .filter_map(|path| path.parts().last().cloned())
            .collect())
    }

    async fn slurp(&self, node: &Node<Self>) -> Result<Bytes, FsError> {
        match node.meta() {
            MemEntry::File(content) => Ok(content),
            MemEntry::Dir => Err(FsError::is_a_directory(node.path().render())),
        }
    }

    async fn stat(&self, node: &Node<Self>) -> Result<Stat, FsError> {
        Ok(match node.meta() {
            MemEntry::Dir => Stat {
                kind: EntryKind::Directory,
                size: 0,
                modified: None,
            },
            MemEntry::File(content) => Stat {
                kind: EntryKind::File,
                size: u64::try_from(content.len()).unwrap(),
                modified: None,
            },
        })
    }
}
