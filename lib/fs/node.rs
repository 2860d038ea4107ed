//! [`Node`]: a handle on one entry of a [`Filesystem`].

use std::fmt;

use bytes::Bytes;
use tracing::{instrument, trace};

use super::{Backend, Filesystem, Stat};
use crate::error::{FsError, Result};
use crate::path::FsPath;
use crate::sync::{self, Arc, RwLock};

/// The shared part of a node. This is what the node cache stores, so a cached
/// entry never keeps its filesystem alive.
pub(crate) struct NodeState<B: Backend> {
    path: B::Path,
    meta: RwLock<B::Meta>,
}

impl<B: Backend> NodeState<B> {
    pub(crate) fn new(path: B::Path, meta: B::Meta) -> Self {
        Self {
            path,
            meta: RwLock::new(meta),
        }
    }
}

/// One entry at a fixed path within one filesystem.
///
/// Nodes are cheap to clone. The path never changes; the metadata reflects
/// the entry as of the last hydration and only changes through
/// [`reload`](Self::reload). Clones handed out by the node cache share
/// metadata, so a reload is visible through every clone.
pub struct Node<B: Backend> {
    fs: Filesystem<B>,
    state: Arc<NodeState<B>>,
}

impl<B: Backend> Clone for Node<B> {
    fn clone(&self) -> Self {
        Self {
            fs: self.fs.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: Backend> fmt::Debug for Node<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.state.path)
            .finish_non_exhaustive()
    }
}

/// Two nodes are equal when they name the same path of the same filesystem
/// instance, whether or not they share cached state.
impl<B: Backend> PartialEq for Node<B> {
    fn eq(&self, other: &Self) -> bool {
        self.fs.same_instance(&other.fs) && self.state.path == other.state.path
    }
}

impl<B: Backend> Eq for Node<B> {}

impl<B: Backend> Node<B> {
    pub(crate) fn from_state(fs: Filesystem<B>, state: Arc<NodeState<B>>) -> Self {
        Self { fs, state }
    }

    /// The path of this node.
    #[must_use]
    pub fn path(&self) -> &B::Path {
        &self.state.path
    }

    /// The filesystem this node belongs to.
    #[must_use]
    pub fn filesystem(&self) -> &Filesystem<B> {
        &self.fs
    }

    /// The backend serving this node.
    #[must_use]
    pub fn backend(&self) -> &B {
        self.fs.backend()
    }

    /// A copy of the hydrated metadata.
    #[must_use]
    pub fn meta(&self) -> B::Meta {
        sync::read(&self.state.meta).clone()
    }

    /// Run `f` against the hydrated metadata without cloning it.
    pub fn with_meta<R>(&self, f: impl FnOnce(&B::Meta) -> R) -> R {
        f(&sync::read(&self.state.meta))
    }

    /// Whether `self` and `other` share hydrated state, i.e. one was served
    /// from the node cache entry that produced the other.
    #[must_use]
    pub fn same_entry(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Whether this node's path is the filesystem root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.state.path == *self.fs.root_path()
    }

    /// Whether the backend reports this entry as a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.with_meta(|meta| self.backend().is_dir(meta))
    }

    /// Whether the backend reports this entry as a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.with_meta(|meta| self.backend().is_file(meta))
    }

    /// Fail with [`FsError::NotADirectory`] unless this is a directory.
    pub fn require_dir(&self) -> Result<()> {
        if self.is_dir() {
            Ok(())
        } else {
            Err(FsError::not_a_directory(self.state.path.render()))
        }
    }

    /// Fail with [`FsError::WrongType`] unless this is a regular file.
    pub fn require_file(&self) -> Result<()> {
        if self.is_file() {
            Ok(())
        } else {
            Err(FsError::wrong_type(self.state.path.render()))
        }
    }

    /// The node one segment up. The root is its own parent.
    pub async fn parent(&self) -> Result<Self> {
        if self.is_root() {
            return Ok(self.clone());
        }
        match self.state.path.parent() {
            Some(parent) => self.fs.node(parent, true).await,
            None => Ok(self.clone()),
        }
    }

    /// The entry called `name` inside this directory.
    ///
    /// `.` and `..` are accepted and mean this node and its parent. Anything
    /// else must be a single path segment.
    #[instrument(level = "trace", skip(self), fields(dir = %self.state.path.render()))]
    pub async fn child(&self, name: &str) -> Result<Self> {
        self.require_dir()?;
        match name {
            "." => Ok(self.clone()),
            ".." => self.parent().await,
            _ if !B::Path::is_plain_name(name) => Err(FsError::InvalidName(name.to_owned())),
            _ => self.fs.node(self.state.path.join(name), true).await,
        }
    }

    /// Resolve `expr` starting from this directory.
    ///
    /// Shorthand for [`Filesystem::resolve`] with this node as the start.
    pub async fn go(&self, expr: &str) -> Result<Self> {
        self.fs.resolve(self, expr).await
    }

    /// Names of the entries in this directory.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.require_dir()?;
        self.backend().list(self).await
    }

    /// The full content of this file, as bytes.
    pub async fn slurp(&self) -> Result<Bytes> {
        self.require_file()?;
        self.backend().slurp(self).await
    }

    /// The full content of this file, decoded as UTF-8.
    pub async fn slurp_to_string(&self) -> Result<String> {
        let bytes = self.slurp().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| FsError::InvalidData(self.state.path.render()))
    }

    /// A metadata snapshot of this entry.
    pub async fn stat(&self) -> Result<Stat> {
        self.backend().stat(self).await
    }

    /// Re-hydrate this node in place, bypassing whatever the cache holds.
    ///
    /// Fails with [`FsError::NotFound`] if the entry has disappeared; the old
    /// metadata is kept in that case.
    pub async fn reload(&self) -> Result<()> {
        let fresh = self
            .backend()
            .hydrate(&self.state.path)
            .await?
            .ok_or_else(|| FsError::not_found(self.state.path.render()))?;
        *sync::write(&self.state.meta) = fresh;
        trace!(path = %self.state.path.render(), "reloaded node");
        Ok(())
    }

    /// Create a directory called `name` inside this one.
    ///
    /// No backend supports writes; this reports [`FsError::Unsupported`] once
    /// the directory guard passes.
    pub fn mkdir(&self, name: &str) -> Result<Self> {
        self.require_dir()?;
        Err(FsError::unsupported(
            self.state.path.join(name).render(),
            "mkdir",
        ))
    }
}
