use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::ngtsc::logging::Logger;
use crate::path_mappings::PathMappings;

/// Directory ngcc writes its own output to; never scanned.
pub const NGCC_DIRECTORY: &str = "__ngcc__";

/// Hidden entries, `node_modules` and ngcc's own folder are skipped while walking.
pub fn is_ignorable_path(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules" || name == NGCC_DIRECTORY
}

/// The directories to scan for entry-points: the source directory plus path-mapping targets.
///
/// No returned path is nested inside another; a `node_modules` source directory is always kept.
pub fn get_base_paths(
    fs: &dyn FileSystem,
    logger: &dyn Logger,
    source_directory: &AbsoluteFsPath,
    path_mappings: Option<&PathMappings>,
) -> Vec<AbsoluteFsPath> {
    let mut base_paths = vec![source_directory.clone()];

    if let Some(mappings) = path_mappings {
        let base_url = fs.resolve(&[mappings.base_url.as_str()]);
        if fs.is_root(&base_url) {
            logger.warn(&format!(
                "The provided pathMappings baseUrl is the root path {}.\n\
                 This is likely to mess up how ngcc finds entry-points and is probably not correct.\n\
                 Please check your path mappings configuration such as in the tsconfig.json file.",
                base_url
            ));
        }

        for path in mappings.paths.values().flatten() {
            let prefix = path.split('*').next().unwrap_or_default();
            let mut found_match = false;
            let mut base_path = fs.resolve(&[base_url.as_str(), prefix]);
            if fs.stat(&base_path).map_or(false, |s| s.is_file()) {
                base_path = AbsoluteFsPath::new(fs.dirname(base_path.as_str()));
            }
            if fs.exists(&base_path) {
                found_match = true;
                base_paths.push(base_path.clone());
            } else {
                // `dist/lib-*` names every folder of `dist` starting with `lib-`.
                let container = AbsoluteFsPath::new(fs.dirname(base_path.as_str()));
                let wildcard_prefix = fs.basename(base_path.as_str(), None);
                if is_existing_directory(fs, &container) {
                    for candidate in fs.readdir(&container).unwrap_or_default() {
                        if candidate.as_str().starts_with(wildcard_prefix.as_str()) {
                            let candidate_path = fs.resolve(&[container.as_str(), candidate.as_str()]);
                            if is_existing_directory(fs, &candidate_path) {
                                found_match = true;
                                base_paths.push(candidate_path);
                            }
                        }
                    }
                }
            }

            if !found_match {
                logger.debug(&format!(
                    "The basePath \"{}\" computed from baseUrl \"{}\" and path mapping \"{}\" does not exist in the file-system.\n\
                     It will not be scanned for entry-points.",
                    base_path, base_url, path
                ));
            }
        }
    }

    let mut deduped = dedupe_paths(fs, base_paths);
    if fs.basename(source_directory.as_str(), None).as_str() == "node_modules"
        && !deduped.contains(source_directory)
    {
        deduped.insert(0, source_directory.clone());
    }
    deduped
}

fn is_existing_directory(fs: &dyn FileSystem, path: &AbsoluteFsPath) -> bool {
    fs.stat(path).map_or(false, |s| s.is_directory())
}

/// Drop duplicates and any path contained in another path of the list.
pub fn dedupe_paths(fs: &dyn FileSystem, paths: Vec<AbsoluteFsPath>) -> Vec<AbsoluteFsPath> {
    let contains = |outer: &AbsoluteFsPath, inner: &AbsoluteFsPath| {
        let relative = fs.relative(outer.as_str(), inner.as_str());
        !relative.starts_with("..") && !fs.is_rooted(&relative)
    };

    let mut result: Vec<AbsoluteFsPath> = Vec::new();
    for (index, path) in paths.iter().enumerate() {
        let shadowed = paths.iter().enumerate().any(|(other_index, other)| {
            if other == path {
                other_index < index
            } else {
                contains(other, path)
            }
        });
        if !shadowed {
            result.push(path.clone());
        }
    }
    result
}

/// Seconds elapsed while running `f`, rounded to one decimal.
pub fn track_duration<T>(f: impl FnOnce() -> T, log: impl FnOnce(f64)) -> T {
    let start = std::time::Instant::now();
    let result = f();
    log((start.elapsed().as_secs_f64() * 10.0).round() / 10.0);
    result
}
