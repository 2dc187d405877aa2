use crate::error::{NgccError, NgccResult};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::ngtsc::logging::Logger;
use crate::packages::configuration::NgccConfiguration;
use crate::packages::entry_point::{get_entry_point_info, EntryPoint, GetEntryPointResult};
use crate::utils::hash_contents;
use crate::version::NGCC_VERSION;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const ENTRY_POINT_MANIFEST_FILENAME: &str = "__ngcc_entry_points__.json";

const LOCK_FILES: [&str; 2] = ["yarn.lock", "package-lock.json"];

/// The minimal record needed to rebuild an `EntryPoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPointSummary {
    pub package_path: AbsoluteFsPath,
    pub entry_point_path: AbsoluteFsPath,
    pub compiled_by_angular: bool,
    pub ignore_missing_dependencies: bool,
    pub generate_deep_reexports: bool,
}

impl EntryPointSummary {
    fn from_entry_point(entry_point: &EntryPoint) -> Self {
        Self {
            package_path: entry_point.package_path.clone(),
            entry_point_path: entry_point.path.clone(),
            compiled_by_angular: entry_point.compiled_by_angular,
            ignore_missing_dependencies: entry_point.ignore_missing_dependencies,
            generate_deep_reexports: entry_point.generate_deep_reexports,
        }
    }

    fn matches(&self, entry_point: &EntryPoint) -> bool {
        *self == Self::from_entry_point(entry_point)
    }
}

/// The on-disk manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPointManifestFile {
    pub ngcc_version: String,
    pub config_file_hash: String,
    pub lock_file_hash: String,
    pub entry_point_paths: Vec<EntryPointSummary>,
}

/// A cache of the entry-points found under a base path.
///
/// Reading returns `None` on any cache miss; callers then walk the file system.
pub trait EntryPointManifest {
    fn read_entry_points_using_manifest(
        &self,
        base_path: &AbsoluteFsPath,
    ) -> NgccResult<Option<Vec<EntryPoint>>>;

    fn write_entry_point_manifest(
        &self,
        base_path: &AbsoluteFsPath,
        entry_points: &[EntryPoint],
    ) -> NgccResult<()>;
}

/// Stores the manifest at `<basePath>/__ngcc_entry_points__.json`, fingerprinted by the lock file.
pub struct FileSystemEntryPointManifest<'a> {
    fs: &'a dyn FileSystem,
    config: &'a NgccConfiguration<'a>,
    logger: &'a dyn Logger,
}

impl<'a> FileSystemEntryPointManifest<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &'a NgccConfiguration<'a>, logger: &'a dyn Logger) -> Self {
        Self { fs, config, logger }
    }

    fn manifest_path(&self, base_path: &AbsoluteFsPath) -> AbsoluteFsPath {
        self.fs.resolve(&[base_path.as_str(), ENTRY_POINT_MANIFEST_FILENAME])
    }

    /// Only real `node_modules` folders get a manifest.
    fn supports(&self, base_path: &AbsoluteFsPath) -> bool {
        self.fs.basename(base_path.as_str(), None).as_str() == "node_modules"
    }

    /// Hash of the first lock file found next to `base_path`.
    pub fn compute_lock_file_hash(&self, base_path: &AbsoluteFsPath) -> Option<String> {
        let directory = self.fs.dirname(base_path.as_str());
        LOCK_FILES.iter().find_map(|lock_file| {
            let lock_path = self.fs.resolve(&[&directory, lock_file]);
            self.fs
                .read_file_buffer(&lock_path)
                .ok()
                .map(|contents| hash_contents(&contents))
        })
    }

    fn build_manifest(
        &self,
        lock_file_hash: String,
        entry_points: &[EntryPoint],
    ) -> EntryPointManifestFile {
        EntryPointManifestFile {
            ngcc_version: NGCC_VERSION.to_string(),
            config_file_hash: self.config.hash.clone(),
            lock_file_hash,
            entry_point_paths: entry_points.iter().map(EntryPointSummary::from_entry_point).collect(),
        }
    }
}

impl EntryPointManifest for FileSystemEntryPointManifest<'_> {
    fn read_entry_points_using_manifest(
        &self,
        base_path: &AbsoluteFsPath,
    ) -> NgccResult<Option<Vec<EntryPoint>>> {
        if !self.supports(base_path) {
            return Ok(None);
        }
        let manifest_path = self.manifest_path(base_path);
        let lock_file_hash = match self.compute_lock_file_hash(base_path) {
            Some(hash) => hash,
            None => {
                self.logger.debug(&format!(
                    "Unable to read any lock-file for {}, so entry-point manifest is not used.",
                    base_path
                ));
                return Ok(None);
            }
        };
        if !self.fs.exists(&manifest_path) {
            return Ok(None);
        }

        let manifest: EntryPointManifestFile = match self
            .fs
            .read_file(&manifest_path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
        {
            Some(manifest) => manifest,
            None => {
                self.logger.warn(&format!(
                    "Unable to read the entry-point manifest for {}:\n  {} is not a valid manifest.",
                    base_path, manifest_path
                ));
                return Ok(None);
            }
        };

        if manifest.ngcc_version != NGCC_VERSION
            || manifest.config_file_hash != self.config.hash
            || manifest.lock_file_hash != lock_file_hash
        {
            self.logger.debug(&format!(
                "The entry-point manifest at {} is out of date, so it is being ignored.",
                manifest_path
            ));
            return Ok(None);
        }

        self.logger.debug(&format!(
            "Entry-point manifest found for {} so loading entry-point information directly.",
            base_path
        ));
        let start = Instant::now();

        let mut entry_points = Vec::with_capacity(manifest.entry_point_paths.len());
        for summary in &manifest.entry_point_paths {
            let result = get_entry_point_info(
                self.fs,
                self.config,
                self.logger,
                &summary.package_path,
                &summary.entry_point_path,
            )?;
            match result {
                GetEntryPointResult::Found(entry_point) if summary.matches(&entry_point) => {
                    entry_points.push(*entry_point)
                }
                _ => {
                    self.logger.warn(&format!(
                        "Unable to read the entry-point manifest for {}:\n  The entry-point manifest at {} contained an invalid pair of package paths: [{}, {}]",
                        base_path, manifest_path, summary.package_path, summary.entry_point_path
                    ));
                    return Ok(None);
                }
            }
        }

        self.logger.debug(&format!(
            "Reading entry-points using the manifest entries took {}s.",
            start.elapsed().as_secs_f64().round()
        ));
        Ok(Some(entry_points))
    }

    /// Written to a temporary file first, then moved over the real one.
    fn write_entry_point_manifest(
        &self,
        base_path: &AbsoluteFsPath,
        entry_points: &[EntryPoint],
    ) -> NgccResult<()> {
        if !self.supports(base_path) {
            return Ok(());
        }
        let lock_file_hash = match self.compute_lock_file_hash(base_path) {
            Some(hash) => hash,
            None => return Ok(()),
        };

        let manifest = self.build_manifest(lock_file_hash, entry_points);
        let manifest_path = self.manifest_path(base_path);
        let tmp_path = AbsoluteFsPath::new(format!("{}.__tmp__", manifest_path));
        let contents =
            serde_json::to_string(&manifest).map_err(|e| NgccError::json(&manifest_path, e))?;

        self.fs
            .write_file(&tmp_path, contents.as_bytes(), None)
            .map_err(|e| NgccError::io(&tmp_path, e))?;
        self.fs
            .move_file(&tmp_path, &manifest_path)
            .map_err(|e| NgccError::io(&manifest_path, e))
    }
}

/// Never reads a manifest, forcing a full walk; still writes a fresh one afterwards.
pub struct InvalidatingEntryPointManifest<'a> {
    inner: FileSystemEntryPointManifest<'a>,
}

impl<'a> InvalidatingEntryPointManifest<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &'a NgccConfiguration<'a>, logger: &'a dyn Logger) -> Self {
        Self {
            inner: FileSystemEntryPointManifest::new(fs, config, logger),
        }
    }
}

impl EntryPointManifest for InvalidatingEntryPointManifest<'_> {
    fn read_entry_points_using_manifest(
        &self,
        _base_path: &AbsoluteFsPath,
    ) -> NgccResult<Option<Vec<EntryPoint>>> {
        Ok(None)
    }

    fn write_entry_point_manifest(
        &self,
        base_path: &AbsoluteFsPath,
        entry_points: &[EntryPoint],
    ) -> NgccResult<()> {
        self.inner.write_entry_point_manifest(base_path, entry_points)
    }
}
