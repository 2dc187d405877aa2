//! The top-level driver: find entry-points, plan the tasks and run them.

use crate::dependencies::{default_dependency_hosts, DependencyHost, DependencyResolver, ImportSyntax, SortedEntryPointsInfo};
use crate::entry_point_finder::{DirectoryWalkerEntryPointFinder, EntryPointFinder, TargetedEntryPointFinder};
use crate::error::{NgccError, NgccResult};
use crate::execution::{
    analyze_entry_points, ClusterExecutor, CompileFn, ExecutionSummary, Executor, SingleProcessExecutor, Task,
};
use crate::ngcc_options::{get_shared_setup, NgccOptions, SharedSetup};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::ngtsc::logging::Logger;
use crate::packages::{
    get_entry_point_format, load_package_json, mark_as_processed, EntryPointManifest,
    FileSystemEntryPointManifest, InvalidatingEntryPointManifest, NgccConfiguration,
};
use anyhow::anyhow;

/// Run ngcc with the default compile step, which records each task in the build markers.
pub fn main_ngcc(fs: &dyn FileSystem, logger: &dyn Logger, options: NgccOptions) -> NgccResult<ExecutionSummary> {
    let compile = |task: &Task| mark_task_as_processed(fs, logger, task);
    main_ngcc_with(fs, logger, options, &compile)
}

/// Run ngcc, using `compile` for every task.
pub fn main_ngcc_with(
    fs: &dyn FileSystem,
    logger: &dyn Logger,
    options: NgccOptions,
    compile: &CompileFn<'_>,
) -> NgccResult<ExecutionSummary> {
    let setup = get_shared_setup(fs, logger, options)?;
    let config = NgccConfiguration::new(fs, &setup.project_path)?;
    let path_mappings = setup.path_mappings.as_ref();
    let resolver = DependencyResolver::new(
        fs,
        logger,
        &config,
        default_dependency_hosts(fs, path_mappings),
        DependencyHost::new(ImportSyntax::Dts, fs, path_mappings),
    );

    let sorted = match &setup.absolute_target_entry_point_path {
        Some(target) => {
            let finder = TargetedEntryPointFinder::new(
                fs,
                &config,
                logger,
                &resolver,
                &setup.base_path,
                target,
                path_mappings,
            );
            if !finder.target_needs_processing(&setup.properties_to_consider, setup.compile_all_formats)? {
                logger.debug("The target entry-point has already been processed");
                return Ok(ExecutionSummary::default());
            }
            find_targeted_entry_points(&finder, target)?
        }
        None => {
            let file_system_manifest = FileSystemEntryPointManifest::new(fs, &config, logger);
            let invalidating_manifest = InvalidatingEntryPointManifest::new(fs, &config, logger);
            let manifest: &dyn EntryPointManifest = if setup.invalidate_entry_point_manifest {
                &invalidating_manifest
            } else {
                &file_system_manifest
            };
            DirectoryWalkerEntryPointFinder::new(
                fs,
                &config,
                logger,
                &resolver,
                manifest,
                &setup.base_path,
                path_mappings,
            )
            .find_entry_points()?
        }
    };

    let queue = analyze_entry_points(
        logger,
        sorted,
        &setup.properties_to_consider,
        setup.compile_all_formats,
    )?;
    executor_for(logger, &setup).execute(queue, compile)
}

fn find_targeted_entry_points(
    finder: &TargetedEntryPointFinder<'_>,
    target: &AbsoluteFsPath,
) -> NgccResult<SortedEntryPointsInfo> {
    let sorted = finder.find_entry_points()?;
    if let Some(invalid) = sorted
        .invalid_entry_points
        .iter()
        .find(|invalid| &invalid.entry_point.path == target)
    {
        return Err(NgccError::TargetInvalid {
            path: target.clone(),
            missing: invalid.missing_dependencies.clone(),
        });
    }
    Ok(sorted)
}

fn executor_for<'a>(logger: &'a dyn Logger, setup: &SharedSetup) -> Box<dyn Executor + 'a> {
    if setup.in_parallel {
        Box::new(ClusterExecutor::new(
            logger,
            setup.worker_count,
            setup.error_on_failed_entry_point,
        ))
    } else {
        Box::new(SingleProcessExecutor::new(logger, setup.error_on_failed_entry_point))
    }
}

/// The compile step used when none is supplied.
///
/// Rendering is done elsewhere; this records the format (and its equivalent properties) as
/// processed, plus `typings` when the task owns them.
pub fn mark_task_as_processed(fs: &dyn FileSystem, logger: &dyn Logger, task: &Task) -> anyhow::Result<()> {
    let entry_point = &task.entry_point;
    let format = get_entry_point_format(fs, entry_point, task.format_property).ok_or_else(|| {
        anyhow!(
            "Unable to determine the format of {} for entry-point {}",
            task.format_property,
            entry_point.path
        )
    })?;
    logger.info(&format!(
        "Compiling {} : {} as {}",
        entry_point.name, task.format_property, format
    ));

    let package_json_path = AbsoluteFsPath::new(fs.join(entry_point.path.as_str(), &["package.json"]));
    // Earlier tasks of this entry-point may have added markers since it was loaded.
    let mut package_json =
        load_package_json(fs, &package_json_path).unwrap_or_else(|| entry_point.package_json.clone());
    let mut properties: Vec<&str> = task
        .format_properties_to_mark_as_processed
        .iter()
        .map(|property| property.as_str())
        .collect();
    if task.process_dts {
        properties.push("typings");
    }
    mark_as_processed(fs, &mut package_json, &package_json_path, &properties)?;
    Ok(())
}
