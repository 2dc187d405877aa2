use crate::ngtsc::file_system::src::types::AbsoluteFsPath;
use crate::ngtsc::file_system::src::util::{clean_path, normalize_separators, relative_path};
use crate::ngtsc::file_system::testing::mock_file_system::PathStrategy;

pub struct PosixUtils {
    pub is_case_sensitive: bool,
}

impl PathStrategy for PosixUtils {
    fn split_path(&self, path: &str) -> Vec<String> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    fn dirname(&self, path: &str) -> String {
        let cleaned = clean_path(path);
        match cleaned.rfind('/') {
            Some(0) => "/".to_string(),
            Some(idx) => cleaned[..idx].to_string(),
            None => ".".to_string(),
        }
    }

    fn join(&self, base_path: &str, paths: &[&str]) -> String {
        let mut full_path = base_path.to_string();
        for p in paths {
            full_path.push('/');
            full_path.push_str(p);
        }
        clean_path(&full_path)
    }

    fn relative(&self, from: &str, to: &str) -> String {
        relative_path(&clean_path(from), &clean_path(to))
    }

    fn basename(&self, path: &str, ext: Option<&str>) -> String {
        let cleaned = clean_path(path);
        let name = cleaned.rsplit('/').next().unwrap_or("");
        match ext {
            Some(ext) if name.ends_with(ext) && name.len() > ext.len() => {
                name[..name.len() - ext.len()].to_string()
            }
            _ => name.to_string(),
        }
    }

    fn is_case_sensitive(&self) -> bool {
        self.is_case_sensitive
    }

    fn resolve(&self, cwd: &str, paths: &[&str]) -> AbsoluteFsPath {
        let mut resolved = cwd.to_string();
        for p in paths {
            let p = normalize_separators(p);
            if p.starts_with('/') {
                resolved = p;
            } else if !p.is_empty() {
                resolved.push('/');
                resolved.push_str(&p);
            }
        }
        AbsoluteFsPath::new(clean_path(&resolved))
    }

    fn is_root(&self, path: &str) -> bool {
        clean_path(path) == "/"
    }
}
