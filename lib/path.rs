//! Path flavors.
//!
//! Every backend fixes one path type. Local disk uses platform-native
//! [`PathBuf`]s; object stores use slash-separated [`PosixPath`]s regardless
//! of the host platform.

use std::fmt;
use std::hash::Hash;
use std::path::{Component, Path, PathBuf};

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// The filesystem root (a leading separator, or a drive prefix).
    Root,
    /// `.`
    Current,
    /// `..`
    Parent,
    /// Any other segment.
    Name(String),
}

/// A hierarchical, immutable path.
///
/// Equality and hashing are on the normalized form, so two spellings of the
/// same location compare equal.
pub trait FsPath: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Parse a path expression.
    fn parse(expr: &str) -> Self;

    /// Whether the path starts at a root.
    fn is_absolute(&self) -> bool;

    /// The path one segment up, or `None` if there is no segment to drop.
    #[must_use]
    fn parent(&self) -> Option<Self>;

    /// Append one segment.
    #[must_use]
    fn join(&self, name: &str) -> Self;

    /// The remainder of `self` after `base`, or `None` if `self` is not under `base`.
    fn strip_prefix(&self, base: &Self) -> Option<Self>;

    /// Decompose into segments, in order.
    fn segments(&self) -> Vec<Segment>;

    /// Render for display and error messages.
    fn render(&self) -> String;

    /// Whether `name` is exactly one ordinary segment in this flavor.
    fn is_plain_name(name: &str) -> bool;
}

/// A slash-separated path, independent of the host platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PosixPath {
    absolute: bool,
    parts: Vec<String>,
}

impl PosixPath {
    /// The root path, `/`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            absolute: true,
            parts: Vec::new(),
        }
    }

    /// The normalized segments, without the root.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for PosixPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.absolute, self.parts.is_empty()) {
            (true, _) => write!(f, "/{}", self.parts.join("/")),
            (false, true) => f.write_str("."),
            (false, false) => f.write_str(&self.parts.join("/")),
        }
    }
}

impl FsPath for PosixPath {
    fn parse(expr: &str) -> Self {
        Self {
            absolute: expr.starts_with('/'),
            parts: expr
                .split('/')
                .filter(|p| !p.is_empty() && *p != ".")
                .map(str::to_owned)
                .collect(),
        }
    }

    fn is_absolute(&self) -> bool {
        self.absolute
    }

    fn parent(&self) -> Option<Self> {
        let mut parent = self.clone();
        parent.parts.pop()?;
        Some(parent)
    }

    fn join(&self, name: &str) -> Self {
        let tail = Self::parse(name);
        if tail.absolute {
            return tail;
        }
        let mut joined = self.clone();
        joined.parts.extend(tail.parts);
        joined
    }

    fn strip_prefix(&self, base: &Self) -> Option<Self> {
        if self.absolute != base.absolute {
            return None;
        }
        let rest = self.parts.strip_prefix(base.parts.as_slice())?;
        Some(Self {
            absolute: false,
            parts: rest.to_vec(),
        })
    }

    fn segments(&self) -> Vec<Segment> {
        let root = self.absolute.then_some(Segment::Root);
        root.into_iter()
            .chain(self.parts.iter().map(|p| match p.as_str() {
                ".." => Segment::Parent,
                name => Segment::Name(name.to_owned()),
            }))
            .collect()
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn is_plain_name(name: &str) -> bool {
        !name.is_empty() && name != "." && name != ".." && !name.contains('/')
    }
}

impl FsPath for PathBuf {
    fn parse(expr: &str) -> Self {
        PathBuf::from(expr)
    }

    fn is_absolute(&self) -> bool {
        Path::is_absolute(self)
    }

    fn parent(&self) -> Option<Self> {
        Path::parent(self).map(Path::to_path_buf)
    }

    fn join(&self, name: &str) -> Self {
        Path::join(self, name)
    }

    fn strip_prefix(&self, base: &Self) -> Option<Self> {
        Path::strip_prefix(self, base).ok().map(Path::to_path_buf)
    }

    fn segments(&self) -> Vec<Segment> {
        let mut out = Vec::new();
        for component in self.components() {
            let segment = match component {
                Component::Prefix(_) | Component::RootDir => {
                    if out.last() == Some(&Segment::Root) {
                        continue;
                    }
                    Segment::Root
                }
                Component::CurDir => Segment::Current,
                Component::ParentDir => Segment::Parent,
                Component::Normal(name) => Segment::Name(name.to_string_lossy().into_owned()),
            };
            out.push(segment);
        }
        out
    }

    fn render(&self) -> String {
        self.display().to_string()
    }

    fn is_plain_name(name: &str) -> bool {
        let mut components = Path::new(name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(n)), None) if n == name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_parse_normalizes() {
        assert_eq!(PosixPath::parse("/a//b/./c/"), PosixPath::parse("/a/b/c"));
        assert_eq!(PosixPath::parse("/a/b").render(), "/a/b");
        assert_eq!(PosixPath::parse("a/b").render(), "a/b");
        assert_eq!(PosixPath::parse("").render(), ".");
        assert_eq!(PosixPath::root().render(), "/");
    }

    #[test]
    fn posix_parent_and_join() {
        let path = PosixPath::parse("/a/b");
        assert_eq!(path.parent(), Some(PosixPath::parse("/a")));
        assert_eq!(PosixPath::root().parent(), None);
        assert_eq!(PosixPath::root().join("x"), PosixPath::parse("/x"));
    }

    #[test]
    fn posix_segments_keep_parent_steps() {
        assert_eq!(
            PosixPath::parse("/a/../b").segments(),
            vec![
                Segment::Root,
                Segment::Name("a".to_owned()),
                Segment::Parent,
                Segment::Name("b".to_owned()),
            ]
        );
    }

    #[test]
    fn posix_strip_prefix() {
        let root = PosixPath::root();
        assert_eq!(
            PosixPath::parse("/a/b").strip_prefix(&root),
            Some(PosixPath::parse("a/b"))
        );
        assert_eq!(
            PosixPath::parse("/x/y").strip_prefix(&PosixPath::parse("/a")),
            None
        );
    }

    #[test]
    fn plain_names() {
        assert!(PosixPath::is_plain_name("file.txt"));
        assert!(!PosixPath::is_plain_name("a/b"));
        assert!(!PosixPath::is_plain_name(".."));
        assert!(!PosixPath::is_plain_name(""));
        assert!(PathBuf::is_plain_name("file.txt"));
        assert!(!PathBuf::is_plain_name("a/b"));
        assert!(!PathBuf::is_plain_name("/etc"));
        assert!(!PathBuf::is_plain_name("."));
    }

    #[cfg(unix)]
    #[test]
    fn native_segments() {
        assert_eq!(
            PathBuf::parse("/tmp/./x/..").segments(),
            vec![
                Segment::Root,
                Segment::Name("tmp".to_owned()),
                Segment::Name("x".to_owned()),
                Segment::Parent,
            ]
        );
    }
}
