use super::interface::EntryPointFinder;
use super::utils::get_base_paths;
use crate::dependencies::{DependencyResolver, EntryPointWithDependencies, SortedEntryPointsInfo};
use crate::error::{NgccError, NgccResult};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::ngtsc::logging::Logger;
use crate::packages::{
    get_entry_point_info, has_been_processed, EntryPoint, EntryPointJsonProperty,
    GetEntryPointResult, NgccConfiguration,
};
use crate::path_mappings::PathMappings;
use indexmap::IndexMap;
use std::collections::VecDeque;

/// Finds the target entry-point and only the entry-points it transitively depends on.
pub struct TargetedEntryPointFinder<'a> {
    fs: &'a dyn FileSystem,
    config: &'a NgccConfiguration<'a>,
    logger: &'a dyn Logger,
    resolver: &'a DependencyResolver<'a>,
    base_paths: Vec<AbsoluteFsPath>,
    target_path: AbsoluteFsPath,
}

impl<'a> TargetedEntryPointFinder<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        config: &'a NgccConfiguration<'a>,
        logger: &'a dyn Logger,
        resolver: &'a DependencyResolver<'a>,
        base_path: &AbsoluteFsPath,
        target_path: &AbsoluteFsPath,
        path_mappings: Option<&PathMappings>,
    ) -> Self {
        Self {
            fs,
            config,
            logger,
            resolver,
            base_paths: get_base_paths(fs, logger, base_path, path_mappings),
            target_path: target_path.clone(),
        }
    }

    /// Whether the target still has a format left to process.
    ///
    /// With `compile_all_formats` unset, one processed format is enough. Targets not compiled
    /// by Angular never need processing.
    pub fn target_needs_processing(
        &self,
        properties_to_consider: &[EntryPointJsonProperty],
        compile_all_formats: bool,
    ) -> NgccResult<bool> {
        let entry_point = self
            .get_entry_point(&self.target_path)?
            .ok_or_else(|| NgccError::TargetNotFound {
                path: self.target_path.clone(),
            })?;
        if !entry_point.compiled_by_angular {
            return Ok(false);
        }
        for property in properties_to_consider {
            if entry_point.format_path(*property).is_none() {
                continue;
            }
            if !has_been_processed(&entry_point.package_json, property.as_str()) {
                return Ok(true);
            }
            if !compile_all_formats {
                return Ok(false);
            }
        }
        Ok(false)
    }

    fn get_entry_point(&self, entry_point_path: &AbsoluteFsPath) -> NgccResult<Option<EntryPoint>> {
        let package_path = self.compute_package_path(entry_point_path);
        match get_entry_point_info(self.fs, self.config, self.logger, &package_path, entry_point_path)? {
            GetEntryPointResult::Found(entry_point) => Ok(Some(*entry_point)),
            _ => Ok(None),
        }
    }

    /// The package that contains `entry_point_path`, preferring the configured base paths.
    pub fn compute_package_path(&self, entry_point_path: &AbsoluteFsPath) -> AbsoluteFsPath {
        for base_path in &self.base_paths {
            if entry_point_path.as_str().starts_with(base_path.as_str()) {
                if let Some(package_path) =
                    self.compute_package_path_from_containing_path(entry_point_path, base_path)
                {
                    return package_path;
                }
            }
        }
        self.compute_package_path_from_nearest_node_modules(entry_point_path)
    }

    /// Skip past the last `node_modules` segment, then take the first folder with a `package.json`.
    fn compute_package_path_from_containing_path(
        &self,
        entry_point_path: &AbsoluteFsPath,
        containing_path: &AbsoluteFsPath,
    ) -> Option<AbsoluteFsPath> {
        let relative = self.fs.relative(containing_path.as_str(), entry_point_path.as_str());
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        let mut package_path = containing_path.clone();

        let node_modules_index = segments.iter().rposition(|s| *s == "node_modules");
        let remaining = match node_modules_index {
            None => {
                if self.has_package_json(&package_path) {
                    return Some(package_path);
                }
                &segments[..]
            }
            Some(index) => {
                for segment in &segments[..=index] {
                    package_path = AbsoluteFsPath::new(self.fs.join(package_path.as_str(), &[segment]));
                }
                &segments[index + 1..]
            }
        };

        for segment in remaining {
            package_path = AbsoluteFsPath::new(self.fs.join(package_path.as_str(), &[segment]));
            if self.has_package_json(&package_path) {
                return Some(package_path);
            }
        }
        None
    }

    /// Climb to the folder directly inside the nearest `node_modules` (or `@scope`).
    fn compute_package_path_from_nearest_node_modules(&self, entry_point_path: &AbsoluteFsPath) -> AbsoluteFsPath {
        let mut package_path = entry_point_path.clone();
        let mut scoped_package_path = package_path.clone();
        let mut container_path = AbsoluteFsPath::new(self.fs.dirname(package_path.as_str()));
        while !self.fs.is_root(&container_path) && !container_path.is_node_modules() {
            scoped_package_path = package_path;
            package_path = container_path.clone();
            container_path = AbsoluteFsPath::new(self.fs.dirname(container_path.as_str()));
        }

        if self.has_package_json(&package_path) {
            package_path
        } else if self
            .fs
            .basename(package_path.as_str(), None)
            .as_str()
            .starts_with('@')
            && self.has_package_json(&scoped_package_path)
        {
            scoped_package_path
        } else {
            entry_point_path.clone()
        }
    }

    fn has_package_json(&self, path: &AbsoluteFsPath) -> bool {
        self.fs
            .exists(&AbsoluteFsPath::new(self.fs.join(path.as_str(), &["package.json"])))
    }
}

impl EntryPointFinder for TargetedEntryPointFinder<'_> {
    /// Breadth-first from the target, following the dependencies reported by the hosts.
    fn find_entry_points(&self) -> NgccResult<SortedEntryPointsInfo> {
        let mut unsorted: IndexMap<AbsoluteFsPath, EntryPointWithDependencies> = IndexMap::new();
        let mut unprocessed: VecDeque<AbsoluteFsPath> = VecDeque::from([self.target_path.clone()]);
        let mut target: Option<EntryPoint> = None;

        while let Some(path) = unprocessed.pop_front() {
            if unsorted.contains_key(&path) {
                continue;
            }
            let entry_point = match self.get_entry_point(&path)? {
                Some(entry_point) => entry_point,
                None => continue,
            };
            if path == self.target_path {
                target = Some(entry_point.clone());
            }
            if !entry_point.compiled_by_angular {
                continue;
            }
            let with_dependencies = self.resolver.get_entry_point_with_dependencies(entry_point)?;
            for dependency in &with_dependencies.dep_info.dependencies {
                if !unsorted.contains_key(dependency) {
                    unprocessed.push_back(dependency.clone());
                }
            }
            unsorted.insert(path, with_dependencies);
        }

        let target = target.ok_or_else(|| NgccError::TargetNotFound {
            path: self.target_path.clone(),
        })?;
        let entry_points = unsorted.into_values().collect();
        self.resolver
            .sort_entry_points_with_dependencies(entry_points, Some(&target))
    }
}
