//! The polymorphic filesystem: path resolution over a pluggable [`Backend`],
//! with an optional node cache in front of hydration.

/// The per-backend capability trait.
pub mod backend;
/// Azure-style blob container backend.
pub mod blob;
/// Local disk backend.
pub mod local;
/// Node handles.
pub mod node;

pub use backend::{Backend, EntryKind, Stat};
pub use node::Node;

use std::fmt;

use tracing::{instrument, trace};

use crate::cache::{CacheConfig, TtlLruCache};
use crate::error::{FsError, Result};
use crate::path::{FsPath, Segment};
use crate::sync::Arc;
use node::NodeState;

type NodeCache<B> = TtlLruCache<<B as Backend>::Path, Arc<NodeState<B>>>;

struct FsInner<B: Backend> {
    backend: B,
    root: B::Path,
    cache: Option<NodeCache<B>>,
}

/// A filesystem instance: one backend, one root path, one node cache.
///
/// Cloning is cheap and yields a handle on the same instance; nodes hold such
/// a handle to reach their backend.
pub struct Filesystem<B: Backend> {
    inner: Arc<FsInner<B>>,
}

impl<B: Backend> Clone for Filesystem<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for Filesystem<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem")
            .field("root", &self.inner.root)
            .field("cached", &self.cached_len())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Filesystem<B> {
    /// Create a filesystem over `backend`, rooted at `root`.
    ///
    /// A `cache` with zero capacity or zero TTL disables the node cache, in
    /// which case every resolution re-hydrates.
    pub fn new(backend: B, root: B::Path, cache: CacheConfig) -> Self {
        Self {
            inner: Arc::new(FsInner {
                backend,
                root,
                cache: TtlLruCache::new(cache),
            }),
        }
    }

    /// The backend serving this filesystem.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// The root path.
    #[must_use]
    pub fn root_path(&self) -> &B::Path {
        &self.inner.root
    }

    /// Whether node caching is active.
    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.inner.cache.is_some()
    }

    /// Number of entries currently held by the node cache.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.inner.cache.as_ref().map_or(0, TtlLruCache::len)
    }

    pub(crate) fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The root node.
    pub async fn root(&self) -> Result<Node<B>> {
        self.node(self.inner.root.clone(), true).await
    }

    /// The node at `path`.
    ///
    /// With `use_cache`, a live cache entry is returned without touching the
    /// backend. Otherwise the backend hydrates `path`; no data means
    /// [`FsError::NotFound`]. A freshly hydrated node is always written back
    /// to the cache when caching is enabled, so a bypassing lookup refreshes
    /// the entry for later callers.
    #[instrument(level = "trace", skip(self, path), fields(path = %path.render()))]
    pub async fn node(&self, path: B::Path, use_cache: bool) -> Result<Node<B>> {
        if use_cache
            && let Some(cache) = &self.inner.cache
            && let Some(state) = cache.get(&path)
        {
            trace!("node cache hit");
            return Ok(Node::from_state(self.clone(), state));
        }

        trace!("hydrating node");
        let meta = self
            .inner
            .backend
            .hydrate(&path)
            .await?
            .ok_or_else(|| FsError::not_found(path.render()))?;

        let state = Arc::new(NodeState::new(path.clone(), meta));
        if let Some(cache) = &self.inner.cache {
            cache.insert(path, Arc::clone(&state));
        }
        Ok(Node::from_state(self.clone(), state))
    }

    /// Resolve `expr` starting from the directory `from`.
    ///
    /// Absolute expressions must lie under the root path; the root prefix is
    /// dropped and the rest is resolved from [`root`](Self::root). Each `..`
    /// moves to the parent (the root being its own parent), each `.` is
    /// skipped, and any other segment is a child lookup. The first failing
    /// step decides the error.
    #[instrument(level = "debug", skip(self, from), fields(from = %from.path().render()))]
    pub async fn resolve(&self, from: &Node<B>, expr: &str) -> Result<Node<B>> {
        from.require_dir()?;

        let path = B::Path::parse(expr);
        let (mut current, relative) = if path.is_absolute() {
            let relative = path
                .strip_prefix(&self.inner.root)
                .ok_or_else(|| FsError::not_found(expr))?;
            (self.root().await?, relative)
        } else {
            (from.clone(), path)
        };

        for segment in relative.segments() {
            current = match segment {
                Segment::Root | Segment::Current => current,
                Segment::Parent => current.parent().await?,
                Segment::Name(name) => current.child(&name).await?,
            };
        }
        Ok(current)
    }
}
