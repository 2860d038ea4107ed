//! The per-backend capability surface.

use std::future::Future;
use std::time::SystemTime;

use bytes::Bytes;

use super::Node;
use crate::error::{FsError, Result};
use crate::path::FsPath;

/// The type of an entry, as far as a backend can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// Anything else: symlinks, devices, opaque objects.
    Other,
}

/// A metadata snapshot of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    /// What the entry is.
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the backend records one.
    pub modified: Option<SystemTime>,
}

/// A storage backend.
///
/// A backend fixes a path flavor and a metadata type, and answers the
/// per-entry questions that [`Node`] forwards to it. Content operations
/// default to reporting [`FsError::Unsupported`]; type predicates default to
/// `false`, which makes entries opaque.
///
/// [`Node`] performs the directory/file guards before calling [`list`](Self::list)
/// or [`slurp`](Self::slurp), so implementations can assume the node already
/// passed them.
pub trait Backend: Send + Sync + Sized + 'static {
    /// The path flavor of this backend.
    type Path: FsPath;

    /// Backend-specific data captured when a node is created.
    type Meta: Clone + Send + Sync + 'static;

    /// Produce metadata for `path`, or `Ok(None)` if nothing exists there.
    ///
    /// Called on every node-cache miss and on [`Node::reload`]. Hydration must
    /// be idempotent: concurrent resolution of the same path may call it more
    /// than once.
    fn hydrate(
        &self,
        path: &Self::Path,
    ) -> impl Future<Output = Result<Option<Self::Meta>>> + Send;

    /// Whether an entry with this metadata is a directory.
    fn is_dir(&self, _meta: &Self::Meta) -> bool {
        false
    }

    /// Whether an entry with this metadata is a regular file.
    fn is_file(&self, _meta: &Self::Meta) -> bool {
        false
    }

    /// Names of the entries directly under the directory `node`.
    fn list(&self, node: &Node<Self>) -> impl Future<Output = Result<Vec<String>>> + Send {
        let err = FsError::unsupported(node.path().render(), "list");
        async move { Err(err) }
    }

    /// The full content of the file `node`.
    fn slurp(&self, node: &Node<Self>) -> impl Future<Output = Result<Bytes>> + Send {
        let err = FsError::unsupported(node.path().render(), "slurp");
        async move { Err(err) }
    }

    /// A metadata snapshot of `node`.
    fn stat(&self, node: &Node<Self>) -> impl Future<Output = Result<Stat>> + Send {
        let err = FsError::unsupported(node.path().render(), "stat");
        async move { Err(err) }
    }
}
