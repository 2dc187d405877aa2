use crate::error::{NgccError, NgccResult};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::packages::entry_point::PackageJson;
use crate::utils::hash_contents;
use indexmap::IndexMap;
use regex::Regex;
use semver::{Version, VersionReq};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// File name of both the project-level and the package-level configuration.
pub const NGCC_CONFIG_FILENAME: &str = "ngcc.config.json";

/// Configuration shipped with ngcc for packages that need help being processed.
const DEFAULT_NGCC_CONFIG: &str = r#"{
  "packages": {
    "angular2-highcharts": {
      "entryPoints": {
        ".": { "override": { "main": "./index.js" } }
      }
    },
    "ng2-dragula": {
      "entryPoints": {
        "./dist": { "override": { "main": "../bundles/ng2-dragula.umd.js" } }
      }
    }
  }
}"#;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEntryPointConfig {
    ignore: bool,
    #[serde(rename = "override")]
    override_: Option<PackageJson>,
    ignore_missing_dependencies: bool,
    generate_deep_reexports: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPackageConfig {
    entry_points: IndexMap<String, RawEntryPointConfig>,
    ignorable_deep_import_matchers: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawNgccConfig {
    packages: IndexMap<String, RawPackageConfig>,
}

/// Configuration for one entry-point, keyed by absolute path in `ProcessedPackageConfig`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPointConfig {
    pub ignore: bool,
    pub override_: Option<PackageJson>,
    pub ignore_missing_dependencies: bool,
    pub generate_deep_reexports: bool,
}

/// Package configuration with entry-point paths made absolute and matchers compiled.
#[derive(Debug, Clone)]
pub struct ProcessedPackageConfig {
    pub package_path: AbsoluteFsPath,
    pub version_range: String,
    pub entry_points: IndexMap<AbsoluteFsPath, EntryPointConfig>,
    pub ignorable_deep_import_matchers: Vec<Regex>,
}

impl ProcessedPackageConfig {
    fn empty(package_path: &AbsoluteFsPath) -> Self {
        Self {
            package_path: package_path.clone(),
            version_range: "*".to_string(),
            entry_points: IndexMap::new(),
            ignorable_deep_import_matchers: Vec::new(),
        }
    }

    pub fn is_ignorable_deep_import(&self, import_path: &AbsoluteFsPath) -> bool {
        self.ignorable_deep_import_matchers
            .iter()
            .any(|matcher| matcher.is_match(import_path.as_str()))
    }
}

#[derive(Debug, Clone)]
struct VersionedPackageConfig {
    version_range: String,
    config: RawPackageConfig,
}

type VersionedConfigs = IndexMap<String, Vec<VersionedPackageConfig>>;

/// Per-package overrides, layered as project config > package config > built-in defaults.
pub struct NgccConfiguration<'a> {
    fs: &'a dyn FileSystem,
    default_config: VersionedConfigs,
    project_config: VersionedConfigs,
    cache: RefCell<HashMap<String, Rc<ProcessedPackageConfig>>>,
    /// Fingerprint of the project-level configuration file.
    pub hash: String,
}

impl<'a> NgccConfiguration<'a> {
    /// Load the project configuration found in `base_dir`, if any.
    pub fn new(fs: &'a dyn FileSystem, base_dir: &AbsoluteFsPath) -> NgccResult<Self> {
        let default_path = AbsoluteFsPath::new("<default ngcc config>");
        let defaults: RawNgccConfig = serde_json::from_str(DEFAULT_NGCC_CONFIG)
            .map_err(|e| NgccError::json(&default_path, e))?;

        let project_path = AbsoluteFsPath::new(fs.join(base_dir.as_str(), &[NGCC_CONFIG_FILENAME]));
        let (project, contents) = if fs.exists(&project_path) {
            let contents = fs
                .read_file(&project_path)
                .map_err(|e| NgccError::io(&project_path, e))?;
            let config: RawNgccConfig = serde_json::from_str(&contents)
                .map_err(|e| NgccError::json(&project_path, e))?;
            (config, contents)
        } else {
            (RawNgccConfig::default(), String::new())
        };

        Ok(Self {
            fs,
            default_config: split_versions(defaults),
            project_config: split_versions(project),
            cache: RefCell::new(HashMap::new()),
            hash: hash_contents(contents.as_bytes()),
        })
    }

    /// The configuration that applies to the package at `package_path`.
    pub fn get_package_config(
        &self,
        package_name: &str,
        package_path: &AbsoluteFsPath,
        version: Option<&str>,
    ) -> NgccResult<Rc<ProcessedPackageConfig>> {
        let cache_key = format!("{}@{}", package_path, version.unwrap_or(""));
        if let Some(config) = self.cache.borrow().get(&cache_key) {
            return Ok(Rc::clone(config));
        }

        let config = Rc::new(self.compute_package_config(package_name, package_path, version)?);
        self.cache.borrow_mut().insert(cache_key, Rc::clone(&config));
        Ok(config)
    }

    fn compute_package_config(
        &self,
        package_name: &str,
        package_path: &AbsoluteFsPath,
        version: Option<&str>,
    ) -> NgccResult<ProcessedPackageConfig> {
        let config_path = AbsoluteFsPath::new(self.fs.join(package_path.as_str(), &[NGCC_CONFIG_FILENAME]));

        if let Some(found) = find_satisfactory_version(self.project_config.get(package_name), version) {
            return self.process(package_path, &config_path, found);
        }

        if self.fs.exists(&config_path) {
            let contents = self
                .fs
                .read_file(&config_path)
                .map_err(|e| NgccError::io(&config_path, e))?;
            let config: RawPackageConfig = serde_json::from_str(&contents)
                .map_err(|e| NgccError::json(&config_path, e))?;
            let versioned = VersionedPackageConfig {
                version_range: "*".to_string(),
                config,
            };
            return self.process(package_path, &config_path, &versioned);
        }

        if let Some(found) = find_satisfactory_version(self.default_config.get(package_name), version) {
            return self.process(package_path, &config_path, found);
        }

        Ok(ProcessedPackageConfig::empty(package_path))
    }

    fn process(
        &self,
        package_path: &AbsoluteFsPath,
        config_path: &AbsoluteFsPath,
        versioned: &VersionedPackageConfig,
    ) -> NgccResult<ProcessedPackageConfig> {
        let entry_points = versioned
            .config
            .entry_points
            .iter()
            .map(|(relative, raw)| {
                let path = self.fs.resolve(&[package_path.as_str(), relative]);
                let config = EntryPointConfig {
                    ignore: raw.ignore,
                    override_: raw.override_.clone(),
                    ignore_missing_dependencies: raw.ignore_missing_dependencies,
                    generate_deep_reexports: raw.generate_deep_reexports,
                };
                (path, config)
            })
            .collect();

        let matchers = versioned
            .config
            .ignorable_deep_import_matchers
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| NgccError::InvalidConfiguration {
                    path: config_path.clone(),
                    message: format!("invalid ignorableDeepImportMatchers entry \"{}\": {}", pattern, e),
                })
            })
            .collect::<NgccResult<Vec<_>>>()?;

        Ok(ProcessedPackageConfig {
            package_path: package_path.clone(),
            version_range: versioned.version_range.clone(),
            entry_points,
            ignorable_deep_import_matchers: matchers,
        })
    }
}

/// Split `name@range` keys into per-name lists, keeping declaration order.
fn split_versions(config: RawNgccConfig) -> VersionedConfigs {
    let mut versioned: VersionedConfigs = IndexMap::new();
    for (key, config) in config.packages {
        // The leading `@` of a scoped name is not a version separator.
        let (name, range) = match key.rfind('@') {
            Some(idx) if idx > 0 => (key[..idx].to_string(), key[idx + 1..].to_string()),
            _ => (key.clone(), "*".to_string()),
        };
        versioned.entry(name).or_default().push(VersionedPackageConfig {
            version_range: range,
            config,
        });
    }
    versioned
}

fn find_satisfactory_version<'c>(
    configs: Option<&'c Vec<VersionedPackageConfig>>,
    version: Option<&str>,
) -> Option<&'c VersionedPackageConfig> {
    let configs = configs?;
    match version {
        None => configs.first(),
        Some(version) => configs
            .iter()
            .find(|config| satisfies(version, &config.version_range)),
    }
}

/// npm-style range check: `||` alternatives of whitespace-separated comparators.
pub fn satisfies(version: &str, range: &str) -> bool {
    let version = match Version::parse(version.trim()) {
        Ok(version) => version,
        Err(_) => return false,
    };
    range.split("||").any(|alternative| {
        let alternative = alternative.trim();
        if alternative.is_empty() || alternative == "*" || alternative == "x" {
            return true;
        }
        let comparators = alternative.split_whitespace().collect::<Vec<_>>().join(", ");
        VersionReq::parse(&comparators)
            .map(|req| req.matches(&version))
            .unwrap_or(false)
    })
}
