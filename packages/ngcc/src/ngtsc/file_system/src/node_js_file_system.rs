use crate::ngtsc::file_system::src::types::{
    AbsoluteFsPath, FileStats, FileSystem, PathManipulation, PathSegment, ReadonlyFileSystem,
};
use crate::ngtsc::file_system::src::util::{clean_path, normalize_separators, relative_path};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path manipulation backed by the process working directory.
pub struct NodeJSPathManipulation;

impl PathManipulation for NodeJSPathManipulation {
    fn pwd(&self) -> AbsoluteFsPath {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        AbsoluteFsPath::new(clean_path(&cwd.to_string_lossy()))
    }

    fn resolve(&self, paths: &[&str]) -> AbsoluteFsPath {
        // Right-most absolute segment wins; relative results are anchored at the cwd.
        let mut resolved = String::new();
        for p in paths.iter().rev() {
            let p = normalize_separators(p);
            if p.is_empty() {
                continue;
            }
            resolved = if resolved.is_empty() {
                p.clone()
            } else {
                format!("{}/{}", p, resolved)
            };
            if self.is_rooted(&p) {
                return AbsoluteFsPath::new(clean_path(&resolved));
            }
        }
        let cwd = self.pwd();
        AbsoluteFsPath::new(clean_path(&format!("{}/{}", cwd.as_str(), resolved)))
    }

    fn dirname(&self, file: &str) -> String {
        let cleaned = clean_path(file);
        match cleaned.rfind('/') {
            Some(0) => "/".to_string(),
            Some(idx) if idx == 2 && cleaned.as_bytes()[1] == b':' => cleaned[..3].to_string(),
            Some(idx) => cleaned[..idx].to_string(),
            None => ".".to_string(),
        }
    }

    fn join(&self, base_path: &str, paths: &[&str]) -> String {
        let mut joined = normalize_separators(base_path);
        for p in paths {
            joined.push('/');
            joined.push_str(&normalize_separators(p));
        }
        clean_path(&joined)
    }

    fn is_root(&self, path: &AbsoluteFsPath) -> bool {
        self.dirname(path.as_str()) == clean_path(path.as_str())
    }

    fn is_rooted(&self, path: &str) -> bool {
        let path = normalize_separators(path);
        path.starts_with('/') || (path.len() >= 2 && path.as_bytes()[1] == b':')
    }

    fn relative(&self, from: &str, to: &str) -> String {
        let from = clean_path(from);
        let to = clean_path(to);
        // Paths on different drives have no relative form.
        let drive = |p: &str| {
            (p.len() >= 2 && p.as_bytes()[1] == b':').then(|| p[..1].to_ascii_lowercase())
        };
        if drive(&from) != drive(&to) {
            return to;
        }
        relative_path(&from, &to)
    }

    fn basename(&self, file_path: &str, extension: Option<&str>) -> PathSegment {
        let cleaned = clean_path(file_path);
        let mut name = cleaned.rsplit('/').next().unwrap_or_default().to_string();
        if let Some(ext) = extension {
            if name.ends_with(ext) && name.len() > ext.len() {
                name.truncate(name.len() - ext.len());
            }
        }
        PathSegment::new(name)
    }

}

/// The real, disk-backed file-system.
pub struct NodeJSFileSystem {
    base: NodeJSPathManipulation,
}

impl NodeJSFileSystem {
    pub fn new() -> Self {
        Self {
            base: NodeJSPathManipulation,
        }
    }

    fn to_stats(meta: &fs::Metadata) -> FileStats {
        FileStats {
            is_file: meta.is_file(),
            is_directory: meta.is_dir(),
            is_symbolic_link: meta.file_type().is_symlink(),
        }
    }
}

impl Default for NodeJSFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PathManipulation for NodeJSFileSystem {
    fn is_root(&self, path: &AbsoluteFsPath) -> bool { self.base.is_root(path) }
    fn is_rooted(&self, path: &str) -> bool { self.base.is_rooted(path) }
    fn dirname(&self, file: &str) -> String { self.base.dirname(file) }
    fn join(&self, base_path: &str, paths: &[&str]) -> String { self.base.join(base_path, paths) }
    fn relative(&self, from: &str, to: &str) -> String { self.base.relative(from, to) }
    fn basename(&self, file_path: &str, extension: Option<&str>) -> PathSegment { self.base.basename(file_path, extension) }
    fn resolve(&self, paths: &[&str]) -> AbsoluteFsPath { self.base.resolve(paths) }
    fn pwd(&self) -> AbsoluteFsPath { self.base.pwd() }
}

impl ReadonlyFileSystem for NodeJSFileSystem {
    fn exists(&self, path: &AbsoluteFsPath) -> bool {
        Path::new(path.as_str()).exists()
    }

    fn read_file(&self, path: &AbsoluteFsPath) -> io::Result<String> {
        fs::read_to_string(path.as_str())
    }

    fn read_file_buffer(&self, path: &AbsoluteFsPath) -> io::Result<Vec<u8>> {
        fs::read(path.as_str())
    }

    fn readdir(&self, path: &AbsoluteFsPath) -> io::Result<Vec<PathSegment>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(path.as_str())? {
            let entry = entry?;
            result.push(PathSegment::new(entry.file_name().to_string_lossy().to_string()));
        }
        result.sort();
        Ok(result)
    }

    fn lstat(&self, path: &AbsoluteFsPath) -> io::Result<FileStats> {
        fs::symlink_metadata(path.as_str()).map(|meta| Self::to_stats(&meta))
    }

    fn stat(&self, path: &AbsoluteFsPath) -> io::Result<FileStats> {
        fs::metadata(path.as_str()).map(|meta| Self::to_stats(&meta))
    }
}

impl FileSystem for NodeJSFileSystem {
    fn write_file(
        &self,
        path: &AbsoluteFsPath,
        data: &[u8],
        exclusive: Option<bool>,
    ) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true);
        if exclusive.unwrap_or(false) {
            options.create_new(true);
        } else {
            options.create(true).truncate(true);
        }
        let mut file = options.open(path.as_str())?;
        file.write_all(data)
    }

    fn remove_file(&self, path: &AbsoluteFsPath) -> io::Result<()> {
        fs::remove_file(path.as_str())
    }

    fn symlink(&self, target: &AbsoluteFsPath, path: &AbsoluteFsPath) -> io::Result<()> {
        #[cfg(unix)]
        return std::os::unix::fs::symlink(target.as_str(), path.as_str());
        #[cfg(windows)]
        return std::os::windows::fs::symlink_dir(target.as_str(), path.as_str());
        #[cfg(not(any(unix, windows)))]
        return Err(io::Error::new(io::ErrorKind::Other, "Symlink not supported"));
    }

    fn move_file(&self, from: &AbsoluteFsPath, to: &AbsoluteFsPath) -> io::Result<()> {
        fs::rename(from.as_str(), to.as_str())
    }

    fn ensure_dir(&self, path: &AbsoluteFsPath) -> io::Result<()> {
        fs::create_dir_all(path.as_str())
    }

    fn remove_deep(&self, path: &AbsoluteFsPath) -> io::Result<()> {
        fs::remove_dir_all(path.as_str())
    }
}
