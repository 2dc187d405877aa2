use crate::ngtsc::file_system::{is_relative_path, AbsoluteFsPath, FileSystem};
use crate::path_mappings::PathMappings;
use crate::utils::{is_builtin_module, is_within, resolve_file_with_postfixes};

/// Postfixes tried when resolving a JavaScript module path.
pub const JS_POSTFIXES: &[&str] = &["", ".js", "/index.js"];

/// Postfixes tried when resolving a typings module path.
pub const DTS_POSTFIXES: &[&str] = &["", ".d.ts", "/index.d.ts"];

/// The outcome of resolving an import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedModule {
    /// A module provided by the runtime, such as `fs`. Never missing, never a dependency.
    Builtin,
    /// A file inside the importing package that is not itself an entry-point.
    Relative(AbsoluteFsPath),
    /// A file inside another package that is not one of its entry-points.
    DeepImport(AbsoluteFsPath),
    /// The root directory of an entry-point.
    EntryPoint(AbsoluteFsPath),
}

#[derive(Debug, Clone)]
struct MatchingPattern {
    prefix: String,
    postfix: String,
    has_wildcard: bool,
}

impl MatchingPattern {
    fn parse(pattern: &str) -> Self {
        match pattern.find('*') {
            Some(idx) => MatchingPattern {
                prefix: pattern[..idx].to_string(),
                postfix: pattern[idx + 1..].to_string(),
                has_wildcard: true,
            },
            None => MatchingPattern {
                prefix: pattern.to_string(),
                postfix: String::new(),
                has_wildcard: false,
            },
        }
    }

    /// The text captured by the wildcard, if `name` matches.
    fn matches<'n>(&self, name: &'n str) -> Option<&'n str> {
        if !self.has_wildcard {
            return (name == self.prefix).then_some("");
        }
        if name.len() >= self.prefix.len() + self.postfix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.postfix)
        {
            Some(&name[self.prefix.len()..name.len() - self.postfix.len()])
        } else {
            None
        }
    }

    fn apply(&self, wildcard: &str) -> String {
        if self.has_wildcard {
            format!("{}{}{}", self.prefix, wildcard, self.postfix)
        } else {
            self.prefix.clone()
        }
    }
}

#[derive(Debug, Clone)]
struct ProcessedPathMapping {
    matcher: MatchingPattern,
    templates: Vec<MatchingPattern>,
}

/// Resolves import specifiers the way Node.js does, with optional path mappings layered on top.
pub struct ModuleResolver<'a> {
    fs: &'a dyn FileSystem,
    base_url: Option<AbsoluteFsPath>,
    path_mappings: Vec<ProcessedPathMapping>,
    relative_extensions: &'static [&'static str],
}

impl<'a> ModuleResolver<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        path_mappings: Option<&PathMappings>,
        relative_extensions: &'static [&'static str],
    ) -> Self {
        let processed = path_mappings
            .map(|mappings| {
                mappings
                    .paths
                    .iter()
                    .map(|(pattern, targets)| ProcessedPathMapping {
                        matcher: MatchingPattern::parse(pattern),
                        templates: targets.iter().map(|t| MatchingPattern::parse(t)).collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            fs,
            base_url: path_mappings.map(|m| m.base_url.clone()),
            path_mappings: processed,
            relative_extensions,
        }
    }

    /// Resolve `module_name` as imported from the file `from_path`.
    ///
    /// Returns `None` when nothing on disk matches.
    pub fn resolve_module_import(
        &self,
        module_name: &str,
        from_path: &AbsoluteFsPath,
    ) -> Option<ResolvedModule> {
        if is_relative_path(module_name) {
            return self.resolve_as_relative_path(module_name, from_path);
        }
        if is_builtin_module(module_name) {
            return Some(ResolvedModule::Builtin);
        }
        self.resolve_by_path_mappings(module_name, from_path)
            .or_else(|| self.resolve_as_entry_point(module_name, from_path))
    }

    fn resolve_as_relative_path(
        &self,
        module_name: &str,
        from_path: &AbsoluteFsPath,
    ) -> Option<ResolvedModule> {
        let from_dir = self.fs.dirname(from_path.as_str());
        let candidate = self.fs.resolve(&[&from_dir, module_name]);
        resolve_file_with_postfixes(self.fs, &candidate, self.relative_extensions)
            .map(ResolvedModule::Relative)
    }

    /// A mapped path that is an entry-point wins; otherwise the first mapped file.
    ///
    /// Mapped files inside the importing package are relative modules, anything else is a deep import.
    fn resolve_by_path_mappings(
        &self,
        module_name: &str,
        from_path: &AbsoluteFsPath,
    ) -> Option<ResolvedModule> {
        let mapped_paths = self.find_mapped_paths(module_name);
        if mapped_paths.is_empty() {
            return None;
        }
        let package_path = self.find_package_path(from_path)?;

        for mapped_path in mapped_paths {
            if self.is_entry_point(&mapped_path) {
                return Some(ResolvedModule::EntryPoint(mapped_path));
            }
            if let Some(file) =
                resolve_file_with_postfixes(self.fs, &mapped_path, self.relative_extensions)
            {
                return Some(if is_within(self.fs, &package_path, &mapped_path) {
                    ResolvedModule::Relative(file)
                } else {
                    ResolvedModule::DeepImport(mapped_path)
                });
            }
        }
        None
    }

    /// Walk up from `from_path`, looking in each `node_modules` folder for `module_name`.
    fn resolve_as_entry_point(
        &self,
        module_name: &str,
        from_path: &AbsoluteFsPath,
    ) -> Option<ResolvedModule> {
        let mut folder = from_path.clone();
        while !self.fs.is_root(&folder) {
            folder = AbsoluteFsPath::new(self.fs.dirname(folder.as_str()));
            if folder.is_node_modules() {
                folder = AbsoluteFsPath::new(self.fs.dirname(folder.as_str()));
            }
            let module_path = self.fs.resolve(&[folder.as_str(), "node_modules", module_name]);
            if self.is_entry_point(&module_path) {
                return Some(ResolvedModule::EntryPoint(module_path));
            }
            if resolve_file_with_postfixes(self.fs, &module_path, self.relative_extensions).is_some() {
                return Some(ResolvedModule::DeepImport(module_path));
            }
        }
        None
    }

    fn is_entry_point(&self, module_path: &AbsoluteFsPath) -> bool {
        self.fs
            .exists(&AbsoluteFsPath::new(self.fs.join(module_path.as_str(), &["package.json"])))
    }

    /// The longest matching pattern wins; an exact (wildcard-free) match wins outright.
    fn find_mapped_paths(&self, module_name: &str) -> Vec<AbsoluteFsPath> {
        let base_url = match &self.base_url {
            Some(base_url) => base_url,
            None => return Vec::new(),
        };

        let mut best: Option<(&ProcessedPathMapping, &str)> = None;
        for mapping in &self.path_mappings {
            if let Some(wildcard) = mapping.matcher.matches(module_name) {
                if !mapping.matcher.has_wildcard {
                    best = Some((mapping, wildcard));
                    break;
                }
                let longer = best.map_or(true, |(current, _)| {
                    mapping.matcher.prefix.len() > current.matcher.prefix.len()
                });
                if longer {
                    best = Some((mapping, wildcard));
                }
            }
        }

        best.map(|(mapping, wildcard)| {
            mapping
                .templates
                .iter()
                .map(|template| self.fs.resolve(&[base_url.as_str(), &template.apply(wildcard)]))
                .collect()
        })
        .unwrap_or_default()
    }

    /// The closest ancestor folder of `path` containing a `package.json`.
    fn find_package_path(&self, path: &AbsoluteFsPath) -> Option<AbsoluteFsPath> {
        let mut folder = path.clone();
        while !self.fs.is_root(&folder) {
            folder = AbsoluteFsPath::new(self.fs.dirname(folder.as_str()));
            if self.is_entry_point(&folder) {
                return Some(folder);
            }
        }
        None
    }
}
