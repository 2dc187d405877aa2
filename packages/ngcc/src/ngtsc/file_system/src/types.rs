use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// A fully qualified path in the file system, in POSIX form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbsoluteFsPath(String);

impl AbsoluteFsPath {
    pub fn new(path: impl Into<String>) -> Self {
        AbsoluteFsPath(path.into())
    }

    pub fn from<P: AsRef<Path>>(path: P) -> Self {
        AbsoluteFsPath(path.as_ref().to_string_lossy().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether this path names a directory called `node_modules`.
    pub fn is_node_modules(&self) -> bool {
        self.0.rsplit('/').next() == Some("node_modules")
    }
}

impl AsRef<str> for AbsoluteFsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for AbsoluteFsPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl std::fmt::Display for AbsoluteFsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A path that's relative to another (unspecified) root.
///
/// This does not necessarily have to refer to a physical file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSegment(String);

impl PathSegment {
    pub fn new(path: impl Into<String>) -> Self {
        PathSegment(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PathSegment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Information about an object in the FileSystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symbolic_link: bool,
}

impl FileStats {
    pub fn file() -> Self {
        Self {
            is_file: true,
            is_directory: false,
            is_symbolic_link: false,
        }
    }

    pub fn directory() -> Self {
        Self {
            is_file: false,
            is_directory: true,
            is_symbolic_link: false,
        }
    }

    pub fn symbolic_link() -> Self {
        Self {
            is_file: false,
            is_directory: false,
            is_symbolic_link: true,
        }
    }

    pub fn is_file(&self) -> bool {
        self.is_file
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    pub fn is_symbolic_link(&self) -> bool {
        self.is_symbolic_link
    }
}

/// An abstraction over the path manipulation aspects of a file-system.
pub trait PathManipulation: Send + Sync {
    fn is_root(&self, path: &AbsoluteFsPath) -> bool;
    fn is_rooted(&self, path: &str) -> bool;
    fn dirname(&self, file: &str) -> String;
    fn join(&self, base_path: &str, paths: &[&str]) -> String;

    /// Compute the relative path between `from` and `to`.
    ///
    /// Returns `to` unchanged when the two paths share no root.
    fn relative(&self, from: &str, to: &str) -> String;

    fn basename(&self, file_path: &str, extension: Option<&str>) -> PathSegment;
    fn resolve(&self, paths: &[&str]) -> AbsoluteFsPath;
    fn pwd(&self) -> AbsoluteFsPath;
}

/// An abstraction over the read-only aspects of a file-system.
pub trait ReadonlyFileSystem: PathManipulation {
    fn exists(&self, path: &AbsoluteFsPath) -> bool;
    fn read_file(&self, path: &AbsoluteFsPath) -> io::Result<String>;
    fn read_file_buffer(&self, path: &AbsoluteFsPath) -> io::Result<Vec<u8>>;
    fn readdir(&self, path: &AbsoluteFsPath) -> io::Result<Vec<PathSegment>>;
    fn lstat(&self, path: &AbsoluteFsPath) -> io::Result<FileStats>;
    fn stat(&self, path: &AbsoluteFsPath) -> io::Result<FileStats>;
}

/// A basic interface to abstract the underlying file-system.
pub trait FileSystem: ReadonlyFileSystem {
    fn write_file(
        &self,
        path: &AbsoluteFsPath,
        data: &[u8],
        exclusive: Option<bool>,
    ) -> io::Result<()>;
    fn remove_file(&self, path: &AbsoluteFsPath) -> io::Result<()>;
    fn symlink(&self, target: &AbsoluteFsPath, path: &AbsoluteFsPath) -> io::Result<()>;
    fn move_file(&self, from: &AbsoluteFsPath, to: &AbsoluteFsPath) -> io::Result<()>;
    fn ensure_dir(&self, path: &AbsoluteFsPath) -> io::Result<()>;
    fn remove_deep(&self, path: &AbsoluteFsPath) -> io::Result<()>;
}
