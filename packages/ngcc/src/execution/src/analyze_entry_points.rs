use super::api::Task;
use super::task_queue::TaskQueue;
use crate::dependencies::{InvalidEntryPoint, SortedEntryPointsInfo};
use crate::error::{NgccError, NgccResult};
use crate::ngtsc::logging::Logger;
use crate::packages::{
    has_been_processed, EntryPointJsonProperty, PackageJson, SUPPORTED_FORMAT_PROPERTIES,
};
use indexmap::{IndexMap, IndexSet};
use std::time::Instant;

/// The format properties to compile for one entry-point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertiesToProcess {
    pub properties_to_process: Vec<EntryPointJsonProperty>,
    /// For each considered property, every supported property sharing its bundle.
    pub equivalent_properties: IndexMap<EntryPointJsonProperty, Vec<EntryPointJsonProperty>>,
}

/// Pick the properties to compile: one per distinct bundle, or only the first when
/// `compile_all_formats` is unset.
pub fn get_properties_to_process(
    package_json: &PackageJson,
    properties_to_consider: &[EntryPointJsonProperty],
    compile_all_formats: bool,
) -> PropertiesToProcess {
    let format_path = move |property: EntryPointJsonProperty| {
        package_json.get(property.as_str()).and_then(|value| value.as_str())
    };

    let mut format_paths: IndexSet<&str> = IndexSet::new();
    let mut properties_to_process = Vec::new();
    for &property in properties_to_consider {
        let path = match format_path(property) {
            Some(path) => path,
            None => continue,
        };
        if !format_paths.insert(path) {
            continue;
        }
        properties_to_process.push(property);
        if !compile_all_formats {
            break;
        }
    }

    let mut by_format_path: IndexMap<&str, Vec<EntryPointJsonProperty>> = IndexMap::new();
    for property in SUPPORTED_FORMAT_PROPERTIES {
        if let Some(path) = format_path(property).filter(|path| format_paths.contains(path)) {
            by_format_path.entry(path).or_default().push(property);
        }
    }

    let equivalent_properties = properties_to_consider
        .iter()
        .filter_map(|&property| {
            let equivalents = by_format_path.get(format_path(property)?)?;
            Some((property, equivalents.clone()))
        })
        .collect();

    PropertiesToProcess {
        properties_to_process,
        equivalent_properties,
    }
}

/// Turn the sorted entry-points into a queue of compilation tasks.
///
/// Formats already marked as processed are skipped. Typings are processed by the first task of
/// an entry-point, unless they were processed before.
pub fn analyze_entry_points(
    logger: &dyn Logger,
    sorted: SortedEntryPointsInfo,
    properties_to_consider: &[EntryPointJsonProperty],
    compile_all_formats: bool,
) -> NgccResult<TaskQueue> {
    let start = Instant::now();
    log_invalid_entry_points(logger, &sorted.invalid_entry_points);

    let mut tasks = Vec::new();
    let mut unprocessable = Vec::new();
    for entry_point in &sorted.entry_points {
        let PropertiesToProcess {
            properties_to_process,
            equivalent_properties,
        } = get_properties_to_process(&entry_point.package_json, properties_to_consider, compile_all_formats);

        if properties_to_process.is_empty() {
            unprocessable.push(entry_point.path.to_string());
            continue;
        }

        let mut process_dts = !has_been_processed(&entry_point.package_json, "typings");
        for format_property in properties_to_process {
            if has_been_processed(&entry_point.package_json, format_property.as_str()) {
                logger.debug(&format!(
                    "Skipping {} : {} (already compiled).",
                    entry_point.name, format_property
                ));
                continue;
            }
            tasks.push(Task {
                entry_point: entry_point.clone(),
                format_property,
                format_properties_to_mark_as_processed: equivalent_properties
                    .get(&format_property)
                    .cloned()
                    .unwrap_or_else(|| vec![format_property]),
                process_dts,
            });
            process_dts = false;
        }
    }

    if !unprocessable.is_empty() {
        return Err(NgccError::UnprocessableEntryPoints {
            properties: properties_to_consider
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            entry_points: unprocessable,
        });
    }

    logger.debug(&format!(
        "Analyzed {} entry-points in {:.1}s. (Total tasks: {})",
        sorted.entry_points.len(),
        start.elapsed().as_secs_f64(),
        tasks.len()
    ));
    Ok(TaskQueue::new(tasks, &sorted.graph))
}

fn log_invalid_entry_points(logger: &dyn Logger, invalid_entry_points: &[InvalidEntryPoint]) {
    for invalid in invalid_entry_points {
        logger.error(&format!(
            "Invalid entry-point {}. It is missing required dependencies:\n{}",
            invalid.entry_point.path,
            invalid
                .missing_dependencies
                .iter()
                .map(|dep| format!(" - {}", dep))
                .collect::<Vec<_>>()
                .join("\n")
        ));
    }
}
