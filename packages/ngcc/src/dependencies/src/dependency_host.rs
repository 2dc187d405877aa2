use super::import_extraction::{extract_imports, ImportSyntax};
use super::module_resolver::{ModuleResolver, ResolvedModule, DTS_POSTFIXES, JS_POSTFIXES};
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::packages::EntryPointFormat;
use crate::path_mappings::PathMappings;
use crate::utils::resolve_file_with_postfixes;
use std::collections::{BTreeSet, HashMap, HashSet};

/// What one entry-point file reaches through its imports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyInfo {
    /// Root directories of the entry-points that are imported.
    pub dependencies: BTreeSet<AbsoluteFsPath>,
    /// Specifiers, verbatim, that could not be resolved.
    pub missing: BTreeSet<String>,
    /// Files inside other packages that are imported directly.
    pub deep_imports: BTreeSet<AbsoluteFsPath>,
}

impl DependencyInfo {
    pub fn merge(&mut self, other: DependencyInfo) {
        self.dependencies.extend(other.dependencies);
        self.missing.extend(other.missing);
        self.deep_imports.extend(other.deep_imports);
    }
}

/// Collects the dependencies of an entry-point by following the imports of one module syntax.
pub struct DependencyHost<'a> {
    fs: &'a dyn FileSystem,
    syntax: ImportSyntax,
    resolver: ModuleResolver<'a>,
}

impl<'a> DependencyHost<'a> {
    pub fn new(
        syntax: ImportSyntax,
        fs: &'a dyn FileSystem,
        path_mappings: Option<&PathMappings>,
    ) -> Self {
        Self {
            fs,
            syntax,
            resolver: ModuleResolver::new(fs, path_mappings, Self::postfixes_for(syntax)),
        }
    }

    pub fn syntax(&self) -> ImportSyntax {
        self.syntax
    }

    fn postfixes_for(syntax: ImportSyntax) -> &'static [&'static str] {
        match syntax {
            ImportSyntax::Dts => DTS_POSTFIXES,
            _ => JS_POSTFIXES,
        }
    }

    /// Follow the imports of `entry_point_path` and of every internal module it reaches.
    ///
    /// Internal (relative) modules are visited once each, so import cycles terminate.
    pub fn collect_dependencies(&self, entry_point_path: &AbsoluteFsPath) -> DependencyInfo {
        let mut info = DependencyInfo::default();
        let start = match resolve_file_with_postfixes(
            self.fs,
            entry_point_path,
            Self::postfixes_for(self.syntax),
        ) {
            Some(file) => file,
            None => return info,
        };

        let mut already_seen: HashSet<AbsoluteFsPath> = HashSet::new();
        already_seen.insert(start.clone());
        let mut pending = vec![start];

        while let Some(file) = pending.pop() {
            let contents = match self.fs.read_file(&file) {
                Ok(contents) => contents,
                Err(_) => continue,
            };
            for specifier in extract_imports(self.syntax, &file, &contents) {
                match self.resolver.resolve_module_import(&specifier, &file) {
                    None => {
                        info.missing.insert(specifier);
                    }
                    Some(ResolvedModule::Builtin) => {}
                    Some(ResolvedModule::Relative(module_path)) => {
                        if already_seen.insert(module_path.clone()) {
                            pending.push(module_path);
                        }
                    }
                    Some(ResolvedModule::DeepImport(import_path)) => {
                        info.deep_imports.insert(import_path);
                    }
                    Some(ResolvedModule::EntryPoint(entry_point_path)) => {
                        info.dependencies.insert(entry_point_path);
                    }
                }
            }
        }

        info
    }
}

/// Source-format dependency hosts keyed by the format they handle.
pub type DependencyHostMap<'a> = HashMap<EntryPointFormat, DependencyHost<'a>>;

/// A host for every source format.
pub fn default_dependency_hosts<'a>(
    fs: &'a dyn FileSystem,
    path_mappings: Option<&PathMappings>,
) -> DependencyHostMap<'a> {
    let mut hosts = HashMap::new();
    hosts.insert(
        EntryPointFormat::Esm5,
        DependencyHost::new(ImportSyntax::Esm, fs, path_mappings),
    );
    hosts.insert(
        EntryPointFormat::Esm2015,
        DependencyHost::new(ImportSyntax::Esm, fs, path_mappings),
    );
    hosts.insert(
        EntryPointFormat::Umd,
        DependencyHost::new(ImportSyntax::Umd, fs, path_mappings),
    );
    hosts.insert(
        EntryPointFormat::CommonJs,
        DependencyHost::new(ImportSyntax::CommonJs, fs, path_mappings),
    );
    hosts
}
