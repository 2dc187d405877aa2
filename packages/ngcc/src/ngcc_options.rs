//! Options accepted by `main_ngcc`, and their resolution against the file system.

use crate::error::{NgccError, NgccResult};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::ngtsc::logging::Logger;
use crate::packages::{EntryPointJsonProperty, SUPPORTED_FORMAT_PROPERTIES};
use crate::path_mappings::{read_path_mappings_from_tsconfig, PathMappings};

/// Environment variable overriding the number of worker threads.
pub const NGCC_MAX_WORKERS_ENV: &str = "NGCC_MAX_WORKERS";

/// Where path mappings are read from, when none are given explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TsConfigSetting {
    /// `tsconfig.json` next to the base path's parent, when it exists.
    #[default]
    Inferred,
    Path(String),
    /// Never read a tsconfig.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct NgccOptions {
    /// The directory to search for entry-points, usually `node_modules`.
    pub base_path: String,
    /// Only process this entry-point and its dependencies.
    pub target_entry_point_path: Option<String>,
    pub properties_to_consider: Vec<EntryPointJsonProperty>,
    /// Compile every format of an entry-point rather than just the first available one.
    pub compile_all_formats: bool,
    pub path_mappings: Option<PathMappings>,
    pub tsconfig: TsConfigSetting,
    pub error_on_failed_entry_point: bool,
    pub invalidate_entry_point_manifest: bool,
    pub max_workers: Option<usize>,
    /// Allow the cluster executor; otherwise tasks run on the calling thread.
    pub async_mode: bool,
}

impl Default for NgccOptions {
    fn default() -> Self {
        Self {
            base_path: "./node_modules".to_string(),
            target_entry_point_path: None,
            properties_to_consider: SUPPORTED_FORMAT_PROPERTIES.to_vec(),
            compile_all_formats: true,
            path_mappings: None,
            tsconfig: TsConfigSetting::Inferred,
            error_on_failed_entry_point: false,
            invalidate_entry_point_manifest: false,
            max_workers: None,
            async_mode: true,
        }
    }
}

/// `NgccOptions` with every default and path resolved.
#[derive(Debug, Clone)]
pub struct SharedSetup {
    pub base_path: AbsoluteFsPath,
    /// The directory containing `base_path`; home of `ngcc.config.json` and the lock file.
    pub project_path: AbsoluteFsPath,
    pub absolute_target_entry_point_path: Option<AbsoluteFsPath>,
    pub path_mappings: Option<PathMappings>,
    pub properties_to_consider: Vec<EntryPointJsonProperty>,
    pub compile_all_formats: bool,
    pub error_on_failed_entry_point: bool,
    pub invalidate_entry_point_manifest: bool,
    pub worker_count: usize,
    pub in_parallel: bool,
}

pub fn get_shared_setup(
    fs: &dyn FileSystem,
    logger: &dyn Logger,
    options: NgccOptions,
) -> NgccResult<SharedSetup> {
    let base_path = fs.resolve(&[&options.base_path]);
    let project_path = AbsoluteFsPath::new(fs.dirname(base_path.as_str()));

    let path_mappings = match options.path_mappings {
        Some(mappings) => Some(mappings),
        None => match tsconfig_path(fs, &options.tsconfig, &project_path) {
            Some(tsconfig_path) => read_path_mappings_from_tsconfig(fs, logger, &tsconfig_path)?,
            None => None,
        },
    };

    let absolute_target_entry_point_path = options
        .target_entry_point_path
        .as_deref()
        .map(|target| fs.resolve(&[base_path.as_str(), target]));
    // Targeted runs always stop at the first failed entry-point.
    let error_on_failed_entry_point =
        options.error_on_failed_entry_point || absolute_target_entry_point_path.is_some();

    if options.properties_to_consider.is_empty() {
        return Err(NgccError::InvalidConfiguration {
            path: base_path,
            message: format!(
                "No supported format property to consider. Supported properties: {}",
                SUPPORTED_FORMAT_PROPERTIES
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        });
    }

    let worker_count = options.max_workers.unwrap_or_else(default_max_workers).max(1);
    Ok(SharedSetup {
        base_path,
        project_path,
        absolute_target_entry_point_path,
        path_mappings,
        properties_to_consider: options.properties_to_consider,
        compile_all_formats: options.compile_all_formats,
        error_on_failed_entry_point,
        invalidate_entry_point_manifest: options.invalidate_entry_point_manifest,
        worker_count,
        in_parallel: options.async_mode && worker_count > 1,
    })
}

fn tsconfig_path(
    fs: &dyn FileSystem,
    setting: &TsConfigSetting,
    project_path: &AbsoluteFsPath,
) -> Option<AbsoluteFsPath> {
    match setting {
        TsConfigSetting::Disabled => None,
        TsConfigSetting::Inferred => {
            let inferred = AbsoluteFsPath::new(fs.join(project_path.as_str(), &["tsconfig.json"]));
            fs.exists(&inferred).then_some(inferred)
        }
        TsConfigSetting::Path(path) => {
            let explicit = fs.resolve(&[path]);
            let is_directory = fs.stat(&explicit).map_or(false, |stats| stats.is_directory());
            Some(if is_directory {
                AbsoluteFsPath::new(fs.join(explicit.as_str(), &["tsconfig.json"]))
            } else {
                explicit
            })
        }
    }
}

/// `NGCC_MAX_WORKERS` when set, else one less than the available cores, between 1 and 4.
pub fn default_max_workers() -> usize {
    if let Some(workers) = std::env::var(NGCC_MAX_WORKERS_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
    {
        return workers.max(1);
    }
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    cores.saturating_sub(1).clamp(1, 4)
}
