use super::interface::EntryPointFinder;
use super::utils::{get_base_paths, is_ignorable_path, track_duration};
use crate::dependencies::{DependencyResolver, SortedEntryPointsInfo};
use crate::error::{NgccError, NgccResult};
use crate::ngtsc::file_system::{strip_js_extension, AbsoluteFsPath, FileSystem, PathSegment};
use crate::ngtsc::logging::Logger;
use crate::packages::{get_entry_point_info, EntryPoint, EntryPointManifest, GetEntryPointResult, NgccConfiguration};
use crate::path_mappings::PathMappings;

/// Finds every entry-point under the source directory and the path-mapping targets.
pub struct DirectoryWalkerEntryPointFinder<'a> {
    fs: &'a dyn FileSystem,
    config: &'a NgccConfiguration<'a>,
    logger: &'a dyn Logger,
    resolver: &'a DependencyResolver<'a>,
    manifest: &'a dyn EntryPointManifest,
    base_paths: Vec<AbsoluteFsPath>,
}

impl<'a> DirectoryWalkerEntryPointFinder<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        config: &'a NgccConfiguration<'a>,
        logger: &'a dyn Logger,
        resolver: &'a DependencyResolver<'a>,
        manifest: &'a dyn EntryPointManifest,
        source_directory: &AbsoluteFsPath,
        path_mappings: Option<&PathMappings>,
    ) -> Self {
        let base_paths = get_base_paths(fs, logger, source_directory, path_mappings);
        Self {
            fs,
            config,
            logger,
            resolver,
            manifest,
            base_paths,
        }
    }

    /// Walk `base_path` and, once the walk succeeded, record what was found in the manifest.
    fn walk_base_path_for_packages(&self, base_path: &AbsoluteFsPath) -> NgccResult<Vec<EntryPoint>> {
        self.logger.debug(&format!(
            "No manifest found for {} so walking the directories for entry-points.",
            base_path
        ));
        let entry_points = track_duration(
            || self.walk_directory_for_packages(base_path),
            |duration| {
                self.logger
                    .debug(&format!("Walking {} for entry-points took {}s.", base_path, duration))
            },
        )?;

        if let Err(e) = self.manifest.write_entry_point_manifest(base_path, &entry_points) {
            self.logger
                .warn(&format!("Unable to write the entry-point manifest for {}: {}", base_path, e));
        }
        Ok(entry_points)
    }

    /// A package directory contributes its primary and secondary entry-points; any other
    /// directory is searched for packages, one level deeper for `@scope` folders.
    fn walk_directory_for_packages(&self, source_directory: &AbsoluteFsPath) -> NgccResult<Vec<EntryPoint>> {
        let primary = get_entry_point_info(
            self.fs,
            self.config,
            self.logger,
            source_directory,
            source_directory,
        )?;

        let mut entry_points = Vec::new();
        match primary {
            // A broken package is unlikely to contain Angular entry-points.
            GetEntryPointResult::Invalid => return Ok(entry_points),
            GetEntryPointResult::NoEntryPoint => {}
            found_or_ignored => {
                if let GetEntryPointResult::Found(entry_point) = found_or_ignored {
                    entry_points.push(*entry_point);
                }
                let children = self.readdir(source_directory)?;
                self.collect_secondary_entry_points(
                    &mut entry_points,
                    source_directory,
                    source_directory,
                    children,
                )?;

                // Nested node_modules only matter to packages built by Angular.
                if entry_points.iter().any(|e| e.compiled_by_angular) {
                    let nested = self.fs.resolve(&[source_directory.as_str(), "node_modules"]);
                    if self.fs.exists(&nested) {
                        entry_points.extend(self.walk_directory_for_packages(&nested)?);
                    }
                }
                return Ok(entry_points);
            }
        }

        for name in self.readdir(source_directory)? {
            if is_ignorable_path(name.as_str()) {
                continue;
            }
            let absolute_path = self.fs.resolve(&[source_directory.as_str(), name.as_str()]);
            let stat = self
                .fs
                .lstat(&absolute_path)
                .map_err(|e| NgccError::io(&absolute_path, e))?;
            if stat.is_symbolic_link() || !stat.is_directory() {
                continue;
            }
            entry_points.extend(self.walk_directory_for_packages(&absolute_path)?);
        }
        Ok(entry_points)
    }

    fn collect_secondary_entry_points(
        &self,
        entry_points: &mut Vec<EntryPoint>,
        package_path: &AbsoluteFsPath,
        directory: &AbsoluteFsPath,
        names: Vec<PathSegment>,
    ) -> NgccResult<()> {
        for name in names {
            if is_ignorable_path(name.as_str()) {
                continue;
            }
            let absolute_path = self.fs.resolve(&[directory.as_str(), name.as_str()]);
            let stat = self
                .fs
                .lstat(&absolute_path)
                .map_err(|e| NgccError::io(&absolute_path, e))?;
            if stat.is_symbolic_link() {
                continue;
            }
            let is_directory = stat.is_directory();
            if !is_directory && !name.as_str().ends_with(".js") {
                continue;
            }

            // `foo.js` may be the bundle of a `foo` entry-point that only exists through configuration.
            let possible_entry_point_path = if is_directory {
                absolute_path.clone()
            } else {
                AbsoluteFsPath::new(strip_js_extension(absolute_path.as_str()))
            };
            let sub_entry_point = get_entry_point_info(
                self.fs,
                self.config,
                self.logger,
                package_path,
                &possible_entry_point_path,
            )?;
            let is_entry_point = matches!(sub_entry_point, GetEntryPointResult::Found(_));
            if let GetEntryPointResult::Found(entry_point) = sub_entry_point {
                entry_points.push(*entry_point);
            }
            if !is_directory {
                continue;
            }

            let child_names = self.readdir(&absolute_path)?;
            // Plain directories holding JS files are code folders, not entry-point containers.
            let has_js_files = child_names.iter().any(|child| {
                child.as_str().ends_with(".js")
                    && self
                        .fs
                        .stat(&self.fs.resolve(&[absolute_path.as_str(), child.as_str()]))
                        .map_or(false, |s| s.is_file())
            });
            if !is_entry_point && has_js_files {
                continue;
            }
            self.collect_secondary_entry_points(entry_points, package_path, &absolute_path, child_names)?;
        }
        Ok(())
    }

    fn readdir(&self, path: &AbsoluteFsPath) -> NgccResult<Vec<PathSegment>> {
        self.fs.readdir(path).map_err(|e| NgccError::io(path, e))
    }
}

impl EntryPointFinder for DirectoryWalkerEntryPointFinder<'_> {
    fn find_entry_points(&self) -> NgccResult<SortedEntryPointsInfo> {
        let mut unsorted = Vec::new();
        for base_path in &self.base_paths {
            let entry_points = match self.manifest.read_entry_points_using_manifest(base_path)? {
                Some(entry_points) => entry_points,
                None => self.walk_base_path_for_packages(base_path)?,
            };
            unsorted.extend(entry_points);
        }
        self.resolver.sort_entry_points_by_dependency(unsorted, None)
    }
}
