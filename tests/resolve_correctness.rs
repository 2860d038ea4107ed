#![allow(clippy::unwrap_used, missing_docs)]

mod common;

use anyfs::{Backend, CacheConfig, Filesystem, FsError, FsPath, PosixPath};
use common::go;
use common::memory_backend::{MemEntry, MemoryBackend};

fn sample_fs() -> (MemoryBackend, Filesystem<MemoryBackend>) {
    let backend = MemoryBackend::sample();
    let fs = Filesystem::new(backend.clone(), PosixPath::root(), CacheConfig::default());
    (backend, fs)
}

#[tokio::test]
async fn root_is_its_own_parent() {
    let (_, fs) = sample_fs();
    let root = fs.root().await.unwrap();
    assert!(root.is_root());
    assert!(root.is_dir());

    let mut up = root.clone();
    for _ in 0..5 {
        up = up.parent().await.unwrap();
    }
    assert!(up.is_root());
    assert_eq!(up, root);
}

#[tokio::test]
async fn resolves_relative_segments() {
    let (_, fs) = sample_fs();
    let node = go(&fs, "a/c/d.txt").await.unwrap();
    assert_eq!(node.path().render(), "/a/c/d.txt");
    assert!(node.is_file());
    assert!(!node.is_dir());
    assert!(!node.is_root());
}

#[tokio::test]
async fn dot_and_dotdot_navigate() {
    let (_, fs) = sample_fs();
    let node = go(&fs, "./a/c/.././c/../b.txt").await.unwrap();
    assert_eq!(node.path().render(), "/a/b.txt");

    let above_root = go(&fs, "../../a").await.unwrap();
    assert_eq!(above_root.path().render(), "/a");
}

#[tokio::test]
async fn absolute_expression_restarts_at_root() {
    let (_, fs) = sample_fs();
    let deep = go(&fs, "a/c").await.unwrap();
    let node = deep.go("/a/b.txt").await.unwrap();
    assert_eq!(node.path().render(), "/a/b.txt");

    let root = deep.go("/").await.unwrap();
    assert!(root.is_root());
}

#[tokio::test]
async fn absolute_expression_outside_root_is_not_found() {
    let backend = MemoryBackend::sample();
    let fs = Filesystem::new(backend, PosixPath::parse("/a"), CacheConfig::default());
    let root = fs.root().await.unwrap();

    assert_eq!(root.go("/a/c").await.unwrap().path().render(), "/a/c");
    assert_eq!(
        root.go("/elsewhere").await.unwrap_err(),
        FsError::not_found("/elsewhere")
    );
    // The root of this filesystem is /a, so going up from it stays there.
    assert_eq!(root.go("..").await.unwrap(), root);
}

#[tokio::test]
async fn missing_segment_is_not_found() {
    let (_, fs) = sample_fs();
    assert_eq!(
        go(&fs, "a/zzz/d.txt").await.unwrap_err(),
        FsError::not_found("/a/zzz")
    );
}

#[tokio::test]
async fn file_in_the_middle_is_not_a_directory() {
    let (_, fs) = sample_fs();
    assert_eq!(
        go(&fs, "a/b.txt/x").await.unwrap_err(),
        FsError::not_a_directory("/a/b.txt")
    );
}

#[tokio::test]
async fn resolving_from_a_file_fails() {
    let (_, fs) = sample_fs();
    let file = go(&fs, "a/b.txt").await.unwrap();
    assert_eq!(
        file.go("c").await.unwrap_err(),
        FsError::not_a_directory("/a/b.txt")
    );
    assert_eq!(
        fs.resolve(&file, "/a").await.unwrap_err(),
        FsError::not_a_directory("/a/b.txt")
    );
}

#[tokio::test]
async fn child_requires_single_segment() {
    let (_, fs) = sample_fs();
    let a = go(&fs, "a").await.unwrap();
    assert_eq!(
        a.child("c/d.txt").await.unwrap_err(),
        FsError::InvalidName("c/d.txt".to_owned())
    );
    assert_eq!(
        a.child("").await.unwrap_err(),
        FsError::InvalidName(String::new())
    );
    assert_eq!(a.child(".").await.unwrap(), a);
    assert!(a.child("..").await.unwrap().is_root());
    assert_eq!(a.child("c").await.unwrap().path().render(), "/a/c");
}

#[tokio::test]
async fn content_operations_guard_types() {
    let (_, fs) = sample_fs();
    let a = go(&fs, "a").await.unwrap();
    let b = go(&fs, "a/b.txt").await.unwrap();

    assert_eq!(a.list().await.unwrap(), vec!["b.txt", "c"]);
    assert_eq!(b.slurp().await.unwrap(), "bee");
    assert_eq!(b.slurp_to_string().await.unwrap(), "bee");

    assert_eq!(b.list().await.unwrap_err(), FsError::not_a_directory("/a/b.txt"));
    assert_eq!(a.slurp().await.unwrap_err(), FsError::wrong_type("/a"));
    assert_eq!(a.require_file().unwrap_err(), FsError::wrong_type("/a"));
    assert_eq!(b.require_dir().unwrap_err(), FsError::not_a_directory("/a/b.txt"));
}

#[tokio::test]
async fn undecodable_content_is_invalid_data() {
    let backend = MemoryBackend::new().with_file("/bin", vec![0xff, 0xfe, 0x00]);
    let fs = Filesystem::new(backend, PosixPath::root(), CacheConfig::disabled());
    let node = go(&fs, "bin").await.unwrap();

    assert_eq!(node.slurp().await.unwrap().len(), 3);
    assert_eq!(
        node.slurp_to_string().await.unwrap_err(),
        FsError::InvalidData("/bin".to_owned())
    );
}

#[tokio::test]
async fn reload_refreshes_cached_metadata() {
    let (backend, fs) = sample_fs();
    let b = go(&fs, "a/b.txt").await.unwrap();
    let alias = go(&fs, "a/b.txt").await.unwrap();

    backend.put(PosixPath::parse("/a/b.txt"), MemEntry::File("buzz".into()));
    assert_eq!(b.slurp().await.unwrap(), "bee", "metadata is a hydration snapshot");

    b.reload().await.unwrap();
    assert_eq!(b.slurp().await.unwrap(), "buzz");
    assert_eq!(alias.slurp().await.unwrap(), "buzz", "clones share hydrated state");

    backend.remove("/a/b.txt");
    assert_eq!(b.reload().await.unwrap_err(), FsError::not_found("/a/b.txt"));
    assert_eq!(b.slurp().await.unwrap(), "buzz", "failed reload keeps old state");
}

#[tokio::test]
async fn mkdir_is_unsupported() {
    let (_, fs) = sample_fs();
    let a = go(&fs, "a").await.unwrap();
    let b = go(&fs, "a/b.txt").await.unwrap();
    assert_eq!(
        a.mkdir("new").unwrap_err(),
        FsError::unsupported("/a/new", "mkdir")
    );
    assert_eq!(b.mkdir("new").unwrap_err(), FsError::not_a_directory("/a/b.txt"));
}

/// A backend that only knows which paths exist and what they are.
#[derive(Debug, Clone, Copy)]
struct ShapeOnly;

impl Backend for ShapeOnly {
    type Path = PosixPath;
    type Meta = bool;

    async fn hydrate(&self, path: &PosixPath) -> Result<Option<bool>, FsError> {
        Ok(match path.render().as_str() {
            "/" => Some(true),
            "/f" => Some(false),
            _ => None,
        })
    }

    fn is_dir(&self, is_dir: &bool) -> bool {
        *is_dir
    }

    fn is_file(&self, is_dir: &bool) -> bool {
        !*is_dir
    }
}

#[tokio::test]
async fn content_operations_default_to_unsupported() {
    let fs = Filesystem::new(ShapeOnly, PosixPath::root(), CacheConfig::default());
    let root = fs.root().await.unwrap();
    let file = root.child("f").await.unwrap();

    assert_eq!(root.list().await.unwrap_err(), FsError::unsupported("/", "list"));
    assert_eq!(file.slurp().await.unwrap_err(), FsError::unsupported("/f", "slurp"));
    assert_eq!(file.stat().await.unwrap_err(), FsError::unsupported("/f", "stat"));
}

/// Type predicates default to false, which makes every entry opaque.
#[derive(Debug, Clone, Copy)]
struct Opaque;

impl Backend for Opaque {
    type Path = PosixPath;
    type Meta = ();

    async fn hydrate(&self, _path: &PosixPath) -> Result<Option<()>, FsError> {
        Ok(Some(()))
    }
}

#[tokio::test]
async fn opaque_entries_are_neither_files_nor_directories() {
    let fs = Filesystem::new(Opaque, PosixPath::root(), CacheConfig::disabled());
    let root = fs.root().await.unwrap();
    assert!(root.is_root());
    assert!(!root.is_dir());
    assert!(!root.is_file());
    assert_eq!(root.go("x").await.unwrap_err(), FsError::not_a_directory("/"));

    let node = fs.node(PosixPath::parse("/x/y"), true).await.unwrap();
    assert_eq!(node.parent().await.unwrap().path().render(), "/x");
}
