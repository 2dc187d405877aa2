//! Path mappings (`compilerOptions.baseUrl` + `compilerOptions.paths`) read from a tsconfig.

use crate::error::{NgccError, NgccResult};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::ngtsc::logging::Logger;
use crate::utils::strip_json_comments;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An alias table redirecting bare specifiers to locations under `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathMappings {
    pub base_url: AbsoluteFsPath,
    pub paths: IndexMap<String, Vec<String>>,
}

/// Read the path mappings of the tsconfig at `tsconfig_path`.
///
/// Returns `None` when the file has no `baseUrl` or no `paths`.
pub fn read_path_mappings_from_tsconfig(
    fs: &dyn FileSystem,
    logger: &dyn Logger,
    tsconfig_path: &AbsoluteFsPath,
) -> NgccResult<Option<PathMappings>> {
    let contents = fs
        .read_file(tsconfig_path)
        .map_err(|e| NgccError::io(tsconfig_path, e))?;
    let json: Value = serde_json::from_str(&strip_json_comments(&contents))
        .map_err(|e| NgccError::json(tsconfig_path, e))?;

    if is_solution_style(&json) {
        logger.warn(&format!(
            "The inferred tsconfig file \"{}\" appears to be \"solution-style\" since it contains no root files but does contain project references.\n\
             This is probably not wanted, since ngcc is unable to infer settings like \"paths\" mappings from such a file.\n\
             Perhaps you should have explicitly specified one of the referenced projects using the --tsconfig option.",
            tsconfig_path
        ));
    }

    let options = match json.get("compilerOptions") {
        Some(options) => options,
        None => return Ok(None),
    };
    let base_url = options.get("baseUrl").and_then(Value::as_str);
    let paths = options.get("paths").and_then(Value::as_object);
    let (base_url, paths) = match (base_url, paths) {
        (Some(base_url), Some(paths)) => (base_url, paths),
        _ => return Ok(None),
    };

    let tsconfig_dir = fs.dirname(tsconfig_path.as_str());
    let mut mappings = IndexMap::new();
    for (pattern, targets) in paths {
        let targets = targets
            .as_array()
            .ok_or_else(|| NgccError::InvalidConfiguration {
                path: tsconfig_path.clone(),
                message: format!("\"paths\" entry \"{}\" must be an array of strings", pattern),
            })?
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect();
        mappings.insert(pattern.clone(), targets);
    }

    Ok(Some(PathMappings {
        base_url: fs.resolve(&[&tsconfig_dir, base_url]),
        paths: mappings,
    }))
}

fn is_solution_style(json: &Value) -> bool {
    let has_references = json
        .get("references")
        .and_then(Value::as_array)
        .map_or(false, |refs| !refs.is_empty());
    let has_no_files = json
        .get("files")
        .and_then(Value::as_array)
        .map_or(false, |files| files.is_empty());
    has_references && has_no_files
}
