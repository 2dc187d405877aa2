use crate::ngtsc::file_system::src::types::{
    AbsoluteFsPath, FileStats, FileSystem, PathManipulation, PathSegment, ReadonlyFileSystem,
};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use super::mock_file_system_posix::PosixUtils;

const MAX_SYMLINK_DEPTH: usize = 40;

#[derive(Clone, Debug)]
pub enum Entity {
    Folder(Folder),
    File(Vec<u8>),
    SymLink(AbsoluteFsPath),
}

pub type Folder = BTreeMap<String, Entity>;

/// Strategy for path manipulation.
pub trait PathStrategy: Send + Sync {
    fn split_path(&self, path: &str) -> Vec<String>;
    fn dirname(&self, path: &str) -> String;
    fn join(&self, base_path: &str, paths: &[&str]) -> String;
    fn relative(&self, from: &str, to: &str) -> String;
    fn basename(&self, path: &str, ext: Option<&str>) -> String;
    fn is_case_sensitive(&self) -> bool;
    fn resolve(&self, cwd: &str, paths: &[&str]) -> AbsoluteFsPath;
    fn is_root(&self, path: &str) -> bool;
}

/// What a lookup found, detached from the tree lock.
enum Found {
    Folder(Vec<String>),
    File(Vec<u8>),
    SymLink(AbsoluteFsPath),
}

enum Step {
    Done(Option<(Found, String)>),
    Redirect(String),
}

/// An in-memory file-system for tests.
#[derive(Clone)]
pub struct MockFileSystem {
    strategy: Arc<dyn PathStrategy>,
    cwd: Arc<Mutex<AbsoluteFsPath>>,
    file_tree: Arc<Mutex<Folder>>,
}

impl MockFileSystem {
    pub fn new(strategy: Arc<dyn PathStrategy>) -> Self {
        MockFileSystem {
            strategy,
            cwd: Arc::new(Mutex::new(AbsoluteFsPath::new("/"))),
            file_tree: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn new_posix() -> Self {
        Self::new(Arc::new(PosixUtils {
            is_case_sensitive: true,
        }))
    }

    /// Write each file, creating missing parent folders on the way.
    pub fn init_with_files(&self, files: Vec<(&str, &str)>) {
        for (path, content) in files {
            let path = self.resolve(&[path]);
            let dir = AbsoluteFsPath::new(self.dirname(path.as_str()));
            self.ensure_dir(&dir).expect("mock folder");
            self.write_file(&path, content.as_bytes(), None)
                .expect("mock file");
        }
    }

    pub fn chdir(&self, path: &AbsoluteFsPath) {
        *self.cwd.lock().unwrap() = path.clone();
    }

    /// The path with every symbolic link resolved.
    pub fn realpath(&self, path: &AbsoluteFsPath) -> io::Result<AbsoluteFsPath> {
        self.lookup(path.as_str(), true)
            .map(|(_, real)| AbsoluteFsPath::new(real))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Path not found"))
    }

    fn child<'t>(&self, folder: &'t Folder, name: &str) -> Option<&'t Entity> {
        if self.strategy.is_case_sensitive() {
            folder.get(name)
        } else {
            folder
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, entity)| entity)
        }
    }

    fn lookup(&self, path: &str, follow_final: bool) -> Option<(Found, String)> {
        let mut path = path.to_string();
        for _ in 0..MAX_SYMLINK_DEPTH {
            match self.lookup_step(&path, follow_final) {
                Step::Done(found) => return found,
                Step::Redirect(next) => path = next,
            }
        }
        None
    }

    fn lookup_step(&self, path: &str, follow_final: bool) -> Step {
        let tree = self.file_tree.lock().unwrap();
        let segments = self.strategy.split_path(path);
        let mut current: &Folder = &tree;
        let mut real = String::new();

        for (i, segment) in segments.iter().enumerate() {
            let is_last = i == segments.len() - 1;
            real.push('/');
            real.push_str(segment);
            match self.child(current, segment) {
                None => return Step::Done(None),
                Some(Entity::Folder(children)) => {
                    if is_last {
                        return Step::Done(Some((
                            Found::Folder(children.keys().cloned().collect()),
                            real,
                        )));
                    }
                    current = children;
                }
                Some(Entity::File(content)) => {
                    return Step::Done(if is_last {
                        Some((Found::File(content.clone()), real))
                    } else {
                        None
                    });
                }
                Some(Entity::SymLink(target)) => {
                    if is_last && !follow_final {
                        return Step::Done(Some((Found::SymLink(target.clone()), real)));
                    }
                    let rest = segments[i + 1..].join("/");
                    let next = if rest.is_empty() {
                        target.as_str().to_string()
                    } else {
                        self.strategy.join(target.as_str(), &[&rest])
                    };
                    return Step::Redirect(next);
                }
            }
        }

        Step::Done(Some((
            Found::Folder(current.keys().cloned().collect()),
            "/".to_string(),
        )))
    }

    /// Run `f` against the folder that holds the last segment of `path`.
    fn with_parent_mut<T>(
        &self,
        path: &AbsoluteFsPath,
        f: impl FnOnce(&mut Folder, String) -> io::Result<T>,
    ) -> io::Result<T> {
        let mut tree = self.file_tree.lock().unwrap();
        let mut segments = self.strategy.split_path(path.as_str());
        let name = segments
            .pop()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Cannot modify the root"))?;

        let mut current = &mut *tree;
        for segment in segments {
            match current.get_mut(&segment) {
                Some(Entity::Folder(children)) => current = children,
                Some(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("{} is not a directory", segment),
                    ))
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("Directory {} not found", segment),
                    ))
                }
            }
        }
        f(current, name)
    }
}

impl FileSystem for MockFileSystem {
    fn write_file(
        &self,
        path: &AbsoluteFsPath,
        data: &[u8],
        exclusive: Option<bool>,
    ) -> io::Result<()> {
        self.with_parent_mut(path, |folder, name| {
            if exclusive.unwrap_or(false) && folder.contains_key(&name) {
                return Err(io::Error::new(io::ErrorKind::AlreadyExists, "File exists"));
            }
            if let Some(Entity::Folder(_)) = folder.get(&name) {
                return Err(io::Error::new(io::ErrorKind::Other, "Is a directory"));
            }
            folder.insert(name, Entity::File(data.to_vec()));
            Ok(())
        })
    }

    fn remove_file(&self, path: &AbsoluteFsPath) -> io::Result<()> {
        self.with_parent_mut(path, |folder, name| match folder.get(&name) {
            Some(Entity::Folder(_)) => Err(io::Error::new(io::ErrorKind::Other, "Is a directory")),
            Some(_) => {
                folder.remove(&name);
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
        })
    }

    fn symlink(&self, target: &AbsoluteFsPath, path: &AbsoluteFsPath) -> io::Result<()> {
        self.with_parent_mut(path, |folder, name| {
            folder.insert(name, Entity::SymLink(target.clone()));
            Ok(())
        })
    }

    fn move_file(&self, from: &AbsoluteFsPath, to: &AbsoluteFsPath) -> io::Result<()> {
        let content = self.read_file_buffer(from)?;
        self.write_file(to, &content, None)?;
        self.remove_file(from)
    }

    fn ensure_dir(&self, path: &AbsoluteFsPath) -> io::Result<()> {
        let mut tree = self.file_tree.lock().unwrap();
        let mut current = &mut *tree;
        for segment in self.strategy.split_path(path.as_str()) {
            let next = current
                .entry(segment)
                .or_insert_with(|| Entity::Folder(BTreeMap::new()));
            match next {
                Entity::Folder(children) => current = children,
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        "Path component is not a directory",
                    ))
                }
            }
        }
        Ok(())
    }

    fn remove_deep(&self, path: &AbsoluteFsPath) -> io::Result<()> {
        self.with_parent_mut(path, |folder, name| {
            folder.remove(&name);
            Ok(())
        })
    }
}

impl ReadonlyFileSystem for MockFileSystem {
    fn exists(&self, path: &AbsoluteFsPath) -> bool {
        self.lookup(path.as_str(), true).is_some()
    }

    fn read_file(&self, path: &AbsoluteFsPath) -> io::Result<String> {
        let bytes = self.read_file_buffer(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn read_file_buffer(&self, path: &AbsoluteFsPath) -> io::Result<Vec<u8>> {
        match self.lookup(path.as_str(), true) {
            Some((Found::File(content), _)) => Ok(content),
            Some(_) => Err(io::Error::new(io::ErrorKind::Other, "Is a directory")),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File \"{}\" does not exist.", path),
            )),
        }
    }

    fn readdir(&self, path: &AbsoluteFsPath) -> io::Result<Vec<PathSegment>> {
        match self.lookup(path.as_str(), true) {
            Some((Found::Folder(names), _)) => Ok(names.into_iter().map(PathSegment::new).collect()),
            Some(_) => Err(io::Error::new(io::ErrorKind::Other, "Not a directory")),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Directory \"{}\" does not exist.", path),
            )),
        }
    }

    fn lstat(&self, path: &AbsoluteFsPath) -> io::Result<FileStats> {
        match self.lookup(path.as_str(), false) {
            Some((Found::File(_), _)) => Ok(FileStats::file()),
            Some((Found::Folder(_), _)) => Ok(FileStats::directory()),
            Some((Found::SymLink(_), _)) => Ok(FileStats::symbolic_link()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "Path not found")),
        }
    }

    fn stat(&self, path: &AbsoluteFsPath) -> io::Result<FileStats> {
        match self.lookup(path.as_str(), true) {
            Some((Found::File(_), _)) => Ok(FileStats::file()),
            Some((_, _)) => Ok(FileStats::directory()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "Path not found")),
        }
    }
}

impl PathManipulation for MockFileSystem {
    fn dirname(&self, file: &str) -> String {
        self.strategy.dirname(file)
    }

    fn join(&self, base_path: &str, paths: &[&str]) -> String {
        self.strategy.join(base_path, paths)
    }

    fn resolve(&self, paths: &[&str]) -> AbsoluteFsPath {
        let cwd = self.cwd.lock().unwrap();
        self.strategy.resolve(cwd.as_str(), paths)
    }

    fn basename(&self, path: &str, ext: Option<&str>) -> PathSegment {
        PathSegment::new(self.strategy.basename(path, ext))
    }

    fn is_root(&self, path: &AbsoluteFsPath) -> bool {
        self.strategy.is_root(path.as_str())
    }

    fn is_rooted(&self, path: &str) -> bool {
        path.starts_with('/')
    }

    fn relative(&self, from: &str, to: &str) -> String {
        self.strategy.relative(from, to)
    }

    fn pwd(&self) -> AbsoluteFsPath {
        self.cwd.lock().unwrap().clone()
    }
}
