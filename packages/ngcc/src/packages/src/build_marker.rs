use crate::error::{NgccError, NgccResult};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::packages::entry_point::PackageJson;
use crate::version::NGCC_VERSION;
use serde_json::{Map, Value};

/// Key in `package.json` under which processed format properties are recorded.
pub const NGCC_PROPERTY_MARKER: &str = "__processed_by_ivy_ngcc__";

const PREPUBLISH_ONLY: &str = "prepublishOnly";
const PREPUBLISH_ONLY_BACKUP: &str = "prepublishOnly__ivy_ngcc_bak";
const PREVENT_PUBLISH_SCRIPT: &str = "node --eval \"console.error('ERROR: Trying to publish a package that has been compiled by NGCC. This is not allowed.\\nPlease delete and rebuild the package, without compiling with NGCC, before attempting to publish.\\nNote that NGCC may have been run by importing this package into another project that is being built with Ivy enabled.\\n')\" && exit 1";

/// Whether `property` (a format property or `typings`) was processed by this ngcc version.
pub fn has_been_processed(package_json: &PackageJson, property: &str) -> bool {
    package_json
        .get(NGCC_PROPERTY_MARKER)
        .and_then(|markers| markers.get(property))
        .and_then(Value::as_str)
        .map_or(false, |version| version == NGCC_VERSION)
}

/// Record `properties` as processed, in memory and in the `package.json` at `package_json_path`.
///
/// Also installs a `prepublishOnly` script that refuses to publish the processed package.
pub fn mark_as_processed(
    fs: &dyn FileSystem,
    package_json: &mut PackageJson,
    package_json_path: &AbsoluteFsPath,
    properties: &[&str],
) -> NgccResult<()> {
    let markers = package_json
        .entry(NGCC_PROPERTY_MARKER)
        .or_insert_with(|| Value::Object(Map::new()));
    if !markers.is_object() {
        *markers = Value::Object(Map::new());
    }
    if let Value::Object(markers) = markers {
        for property in properties {
            markers.insert(property.to_string(), Value::String(NGCC_VERSION.to_string()));
        }
    }

    let scripts = package_json
        .entry("scripts")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(scripts) = scripts {
        let old = scripts
            .get(PREPUBLISH_ONLY)
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(old) = old.filter(|old| old != PREVENT_PUBLISH_SCRIPT) {
            scripts.insert(PREPUBLISH_ONLY_BACKUP.to_string(), Value::String(old));
        }
        scripts.insert(
            PREPUBLISH_ONLY.to_string(),
            Value::String(PREVENT_PUBLISH_SCRIPT.to_string()),
        );
    }

    let contents = serde_json::to_string_pretty(package_json)
        .map_err(|e| NgccError::json(package_json_path, e))?;
    fs.write_file(package_json_path, format!("{}\n", contents).as_bytes(), None)
        .map_err(|e| NgccError::io(package_json_path, e))
}
