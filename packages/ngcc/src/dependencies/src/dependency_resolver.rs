use super::dep_graph::DepGraph;
use super::dependency_host::{DependencyHost, DependencyHostMap, DependencyInfo};
use crate::error::{NgccError, NgccResult};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::ngtsc::logging::Logger;
use crate::packages::{
    get_entry_point_format, EntryPoint, EntryPointFormat, NgccConfiguration,
    SUPPORTED_FORMAT_PROPERTIES,
};
use std::collections::{BTreeMap, BTreeSet};

/// An entry-point excluded from processing, with the dependencies that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidEntryPoint {
    pub entry_point: EntryPoint,
    /// Unresolvable specifiers, or the path of an invalid entry-point this one depends on.
    pub missing_dependencies: Vec<String>,
}

/// A dependency that is deliberately not part of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct IgnoredDependency {
    pub entry_point: EntryPoint,
    pub dependency_path: AbsoluteFsPath,
}

#[derive(Debug, Clone)]
pub struct EntryPointWithDependencies {
    pub entry_point: EntryPoint,
    pub dep_info: DependencyInfo,
}

#[derive(Debug, Clone)]
pub struct SortedEntryPointsInfo {
    /// Valid entry-points, every one after all of its dependencies.
    pub entry_points: Vec<EntryPoint>,
    pub invalid_entry_points: Vec<InvalidEntryPoint>,
    pub ignored_dependencies: Vec<IgnoredDependency>,
    pub graph: DepGraph<EntryPoint>,
}

struct EntryPointFormatInfo {
    format: EntryPointFormat,
    path: AbsoluteFsPath,
}

/// Orders entry-points so that each one is processed after its dependencies.
pub struct DependencyResolver<'a> {
    fs: &'a dyn FileSystem,
    logger: &'a dyn Logger,
    config: &'a NgccConfiguration<'a>,
    hosts: DependencyHostMap<'a>,
    typings_host: DependencyHost<'a>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        logger: &'a dyn Logger,
        config: &'a NgccConfiguration<'a>,
        hosts: DependencyHostMap<'a>,
        typings_host: DependencyHost<'a>,
    ) -> Self {
        Self {
            fs,
            logger,
            config,
            hosts,
            typings_host,
        }
    }

    /// Sort `entry_points` topologically, reporting those that cannot be processed.
    ///
    /// With a `target`, only the target and its transitive dependencies are returned.
    pub fn sort_entry_points_by_dependency(
        &self,
        entry_points: Vec<EntryPoint>,
        target: Option<&EntryPoint>,
    ) -> NgccResult<SortedEntryPointsInfo> {
        let with_dependencies = entry_points
            .into_iter()
            .map(|entry_point| self.get_entry_point_with_dependencies(entry_point))
            .collect::<NgccResult<Vec<_>>>()?;
        self.sort_entry_points_with_dependencies(with_dependencies, target)
    }

    pub fn sort_entry_points_with_dependencies(
        &self,
        entry_points: Vec<EntryPointWithDependencies>,
        target: Option<&EntryPoint>,
    ) -> NgccResult<SortedEntryPointsInfo> {
        let (graph, invalid_entry_points, ignored_dependencies) =
            self.compute_dependency_graph(entry_points)?;

        let sorted_paths = match target {
            Some(target) if target.compiled_by_angular && graph.has_node(&target.path) => {
                let mut paths = graph.dependencies_of(&target.path);
                paths.push(target.path.clone());
                paths
            }
            Some(_) => Vec::new(),
            None => graph.overall_order(),
        };

        Ok(SortedEntryPointsInfo {
            entry_points: sorted_paths
                .iter()
                .filter_map(|path| graph.get_node_data(path).cloned())
                .collect(),
            invalid_entry_points,
            ignored_dependencies,
            graph,
        })
    }

    /// Collect the source and typings dependencies of an entry-point.
    ///
    /// Entry-points not compiled by Angular are never processed, so they get empty info.
    pub fn get_entry_point_with_dependencies(
        &self,
        entry_point: EntryPoint,
    ) -> NgccResult<EntryPointWithDependencies> {
        let mut dep_info = DependencyInfo::default();
        if entry_point.compiled_by_angular {
            let format_info = self.get_entry_point_format_info(&entry_point)?;
            let host = self
                .hosts
                .get(&format_info.format)
                .ok_or_else(|| NgccError::NoDependencyHost {
                    entry_point: entry_point.path.clone(),
                })?;
            dep_info.merge(host.collect_dependencies(&format_info.path));
            dep_info.merge(self.typings_host.collect_dependencies(&entry_point.typings));
        }
        Ok(EntryPointWithDependencies {
            entry_point,
            dep_info,
        })
    }

    fn get_entry_point_format_info(&self, entry_point: &EntryPoint) -> NgccResult<EntryPointFormatInfo> {
        for property in SUPPORTED_FORMAT_PROPERTIES {
            let format_path = match entry_point.format_path(property) {
                Some(path) => path,
                None => continue,
            };
            if let Some(format) = get_entry_point_format(self.fs, entry_point, property) {
                return Ok(EntryPointFormatInfo {
                    format,
                    path: self.fs.resolve(&[entry_point.path.as_str(), format_path]),
                });
            }
        }
        Err(NgccError::NoSourceFormat {
            entry_point: entry_point.path.clone(),
        })
    }

    fn compute_dependency_graph(
        &self,
        entry_points: Vec<EntryPointWithDependencies>,
    ) -> NgccResult<(DepGraph<EntryPoint>, Vec<InvalidEntryPoint>, Vec<IgnoredDependency>)> {
        let mut graph = DepGraph::new();
        let mut own_missing: BTreeMap<AbsoluteFsPath, Vec<String>> = BTreeMap::new();
        let mut ignored_dependencies = Vec::new();

        let angular_entry_points: Vec<EntryPointWithDependencies> = entry_points
            .into_iter()
            .filter(|e| e.entry_point.compiled_by_angular)
            .collect();
        for e in &angular_entry_points {
            graph.add_node(e.entry_point.path.clone(), e.entry_point.clone());
        }

        for EntryPointWithDependencies {
            entry_point,
            dep_info,
        } in &angular_entry_points
        {
            if !dep_info.missing.is_empty() && !entry_point.ignore_missing_dependencies {
                own_missing.insert(
                    entry_point.path.clone(),
                    dep_info.missing.iter().cloned().collect(),
                );
            } else {
                for dependency_path in &dep_info.dependencies {
                    if dependency_path == &entry_point.path {
                        continue;
                    }
                    if graph.has_node(dependency_path) {
                        graph.add_dependency(&entry_point.path, dependency_path);
                    } else {
                        ignored_dependencies.push(IgnoredDependency {
                            entry_point: entry_point.clone(),
                            dependency_path: dependency_path.clone(),
                        });
                    }
                }
            }

            if !dep_info.deep_imports.is_empty() {
                self.check_deep_imports(entry_point, dep_info, &mut ignored_dependencies)?;
            }
        }

        let invalid_entry_points = remove_invalid_nodes(&mut graph, own_missing);
        Ok((graph, invalid_entry_points, ignored_dependencies))
    }

    fn check_deep_imports(
        &self,
        entry_point: &EntryPoint,
        dep_info: &DependencyInfo,
        ignored_dependencies: &mut Vec<IgnoredDependency>,
    ) -> NgccResult<()> {
        let package_config = self.config.get_package_config(
            &entry_point.package_name,
            &entry_point.package_path,
            entry_point.package_version.as_deref(),
        )?;
        let mut notable = Vec::new();
        for deep_import in &dep_info.deep_imports {
            if package_config.is_ignorable_deep_import(deep_import) {
                ignored_dependencies.push(IgnoredDependency {
                    entry_point: entry_point.clone(),
                    dependency_path: deep_import.clone(),
                });
            } else {
                notable.push(format!("'{}'", deep_import));
            }
        }
        if !notable.is_empty() {
            self.logger.warn(&format!(
                "Entry point '{}' contains deep imports into {}. This is probably not a problem, but may cause the compilation of entry points to be out of order.",
                entry_point.name,
                notable.join(", ")
            ));
        }
        Ok(())
    }
}

/// Remove the entry-points with missing dependencies, and everything that depends on them,
/// from the fully built `graph`.
///
/// A removed dependant blames the invalid direct dependency with the smallest path. The result
/// is sorted by path, so it does not depend on the order the entry-points were given in.
fn remove_invalid_nodes(
    graph: &mut DepGraph<EntryPoint>,
    own_missing: BTreeMap<AbsoluteFsPath, Vec<String>>,
) -> Vec<InvalidEntryPoint> {
    let mut invalid: BTreeSet<AbsoluteFsPath> = own_missing.keys().cloned().collect();
    for path in own_missing.keys() {
        invalid.extend(graph.dependants_of(path));
    }

    let mut removed = Vec::with_capacity(invalid.len());
    for path in &invalid {
        let missing_dependencies = match own_missing.get(path) {
            Some(missing) => missing.clone(),
            None => graph
                .direct_dependencies_of(path)
                .into_iter()
                .filter(|dependency| invalid.contains(dependency))
                .min()
                .map(|blamed| vec![blamed.to_string()])
                .unwrap_or_default(),
        };
        removed.push((path.clone(), missing_dependencies));
    }

    removed
        .into_iter()
        .filter_map(|(path, missing_dependencies)| {
            graph.remove_node(&path).map(|entry_point| InvalidEntryPoint {
                entry_point,
                missing_dependencies,
            })
        })
        .collect()
}
