//! Local disk backend.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, instrument};

use super::{Backend, EntryKind, Filesystem, Node, Stat};
use crate::cache::CacheConfig;
use crate::error::{FsError, Result};

/// The default local root.
#[cfg(windows)]
pub const DEFAULT_ROOT: &str = "C:\\";
/// The default local root.
#[cfg(not(windows))]
pub const DEFAULT_ROOT: &str = "/";

/// A filesystem over the local disk.
pub type LocalFs = Filesystem<LocalBackend>;

/// Serves nodes from the host filesystem using platform-native paths.
///
/// Hydration is a `stat` of the path; the resulting [`Metadata`] decides the
/// entry type. Symlinks are followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

fn render(path: &Path) -> String {
    path.display().to_string()
}

impl Backend for LocalBackend {
    type Path = PathBuf;
    type Meta = Metadata;

    async fn hydrate(&self, path: &PathBuf) -> Result<Option<Metadata>> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| FsError::from_io(render(path), &e))?;
        Ok(Some(meta))
    }

    fn is_dir(&self, meta: &Metadata) -> bool {
        meta.is_dir()
    }

    fn is_file(&self, meta: &Metadata) -> bool {
        meta.is_file()
    }

    #[instrument(level = "debug", skip(self, node), fields(path = %render(node.path())))]
    async fn list(&self, node: &Node<Self>) -> Result<Vec<String>> {
        let path = node.path();
        let io_err = |e: std::io::Error| FsError::from_io(render(path), &e);

        let mut entries = tokio::fs::read_dir(path).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort_unstable();
        debug!(count = names.len(), "listed directory");
        Ok(names)
    }

    async fn slurp(&self, node: &Node<Self>) -> Result<Bytes> {
        let path = node.path();
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| FsError::from_io(render(path), &e))?;
        Ok(Bytes::from(content))
    }

    async fn stat(&self, node: &Node<Self>) -> Result<Stat> {
        Ok(node.with_meta(|meta| {
            let kind = if meta.is_dir() {
                EntryKind::Directory
            } else if meta.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            Stat {
                kind,
                size: meta.len(),
                modified: meta.modified().ok(),
            }
        }))
    }
}

impl Filesystem<LocalBackend> {
    /// A local filesystem rooted at `root`, without node caching.
    ///
    /// Local metadata changes underneath the process, so caching is opt-in
    /// through [`local_with_cache`](Self::local_with_cache).
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::local_with_cache(root, CacheConfig::disabled())
    }

    /// A local filesystem rooted at `root` with the given node cache.
    pub fn local_with_cache(root: impl Into<PathBuf>, cache: CacheConfig) -> Self {
        Self::new(LocalBackend, root.into(), cache)
    }

    /// A local filesystem rooted at the platform root.
    #[must_use]
    pub fn local_default() -> Self {
        Self::local(DEFAULT_ROOT)
    }
}
