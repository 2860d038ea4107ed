//! anyfs: one asynchronous filesystem interface over local disk and blob
//! storage.
//!
//! A [`Filesystem`] pairs a [`Backend`] with a root path and an optional node
//! cache. Callers navigate with [`Filesystem::resolve`] or [`Node::go`] and
//! read through [`Node::list`] and [`Node::slurp`]. Remote backends issue
//! their requests through [`remote::RemoteClient`], which authenticates and
//! retries each request.

/// Caching primitives.
pub mod cache;
/// The filesystem error taxonomy.
pub mod error;
/// Filesystems, nodes and backends.
pub mod fs;
/// Path flavors.
pub mod path;
/// Resilient request layer for remote backends.
pub mod remote;
pub mod sync;

pub use cache::CacheConfig;
pub use error::{FsError, Result};
pub use fs::blob::{BlobBackend, BlobConfig, BlobConfigError, BlobFs, BlobMeta, BlobProperties};
pub use fs::local::{LocalBackend, LocalFs};
pub use fs::{Backend, EntryKind, Filesystem, Node, Stat};
pub use path::{FsPath, PosixPath, Segment};
pub use remote::{RemoteClient, RetryPolicy, SendOptions};

pub use anyfs_http as transport;
