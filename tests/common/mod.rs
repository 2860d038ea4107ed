#![allow(dead_code, missing_docs, clippy::unwrap_used)]

pub mod http_mocks;
pub mod memory_backend;

use anyfs::{Backend, Filesystem, FsError, Node};

/// Resolves `expr` from the root of `fs`.
pub async fn go<B: Backend>(fs: &Filesystem<B>, expr: &str) -> Result<Node<B>, FsError> {
    fs.root().await?.go(expr).await
}
