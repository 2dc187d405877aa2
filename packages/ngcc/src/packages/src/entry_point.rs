use crate::error::NgccResult;
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use crate::ngtsc::logging::Logger;
use crate::packages::configuration::{EntryPointConfig, NgccConfiguration};
use crate::utils::resolve_file_with_postfixes;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Argument, Expression, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The contents of a `package.json` file, key order preserved.
pub type PackageJson = Map<String, Value>;

/// The module format of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPointFormat {
    Esm5,
    Esm2015,
    Umd,
    CommonJs,
}

impl EntryPointFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPointFormat::Esm5 => "esm5",
            EntryPointFormat::Esm2015 => "esm2015",
            EntryPointFormat::Umd => "umd",
            EntryPointFormat::CommonJs => "commonjs",
        }
    }
}

impl fmt::Display for EntryPointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `package.json` property that may point at a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPointJsonProperty {
    Fesm2015,
    Fesm5,
    Es2015,
    Esm2015,
    Esm5,
    Main,
    Module,
    Browser,
}

/// Every format property, in the order they are preferred.
pub const SUPPORTED_FORMAT_PROPERTIES: [EntryPointJsonProperty; 8] = [
    EntryPointJsonProperty::Fesm2015,
    EntryPointJsonProperty::Fesm5,
    EntryPointJsonProperty::Es2015,
    EntryPointJsonProperty::Esm2015,
    EntryPointJsonProperty::Esm5,
    EntryPointJsonProperty::Main,
    EntryPointJsonProperty::Module,
    EntryPointJsonProperty::Browser,
];

impl EntryPointJsonProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPointJsonProperty::Fesm2015 => "fesm2015",
            EntryPointJsonProperty::Fesm5 => "fesm5",
            EntryPointJsonProperty::Es2015 => "es2015",
            EntryPointJsonProperty::Esm2015 => "esm2015",
            EntryPointJsonProperty::Esm5 => "esm5",
            EntryPointJsonProperty::Main => "main",
            EntryPointJsonProperty::Module => "module",
            EntryPointJsonProperty::Browser => "browser",
        }
    }
}

impl fmt::Display for EntryPointJsonProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryPointJsonProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SUPPORTED_FORMAT_PROPERTIES
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown format property \"{}\"", s))
    }
}

/// An importable unit of an npm package that ngcc may process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    pub name: String,
    /// Directory containing the entry-point's `package.json`.
    pub path: AbsoluteFsPath,
    pub package_name: String,
    pub package_version: Option<String>,
    /// Root directory of the containing package.
    pub package_path: AbsoluteFsPath,
    pub package_json: PackageJson,
    pub typings: AbsoluteFsPath,
    /// Whether the entry-point was built with the Angular compiler (has metadata or configuration).
    pub compiled_by_angular: bool,
    pub ignore_missing_dependencies: bool,
    pub generate_deep_reexports: bool,
}

impl EntryPoint {
    /// The value of a format property, when it is a string.
    pub fn format_path(&self, property: EntryPointJsonProperty) -> Option<&str> {
        self.package_json.get(property.as_str()).and_then(Value::as_str)
    }
}

/// The outcome of inspecting a directory for an entry-point.
#[derive(Debug, Clone, PartialEq)]
pub enum GetEntryPointResult {
    Found(Box<EntryPoint>),
    /// No `package.json` and no configuration forcing one.
    NoEntryPoint,
    /// Configuration explicitly ignores this path.
    Ignored,
    /// A `package.json` exists but is unusable: unparsable or without typings.
    Invalid,
}

/// Inspect `entry_point_path`, inside the package at `package_path`.
pub fn get_entry_point_info(
    fs: &dyn FileSystem,
    config: &NgccConfiguration<'_>,
    logger: &dyn Logger,
    package_path: &AbsoluteFsPath,
    entry_point_path: &AbsoluteFsPath,
) -> NgccResult<GetEntryPointResult> {
    let package_package_json_path = fs.resolve(&[package_path.as_str(), "package.json"]);
    let entry_point_package_json_path = fs.resolve(&[entry_point_path.as_str(), "package.json"]);
    let loaded_package_package_json = load_package_json(fs, &package_package_json_path);
    let loaded_entry_point_package_json = if package_package_json_path == entry_point_package_json_path {
        loaded_package_package_json.clone()
    } else {
        load_package_json(fs, &entry_point_package_json_path)
    };

    let (package_name, package_version) =
        get_package_name_and_version(fs, package_path, loaded_package_package_json.as_ref());
    let package_config =
        config.get_package_config(&package_name, package_path, package_version.as_deref())?;
    let entry_point_config = package_config.entry_points.get(entry_point_path);

    let package_json = match entry_point_config {
        None => {
            if !fs.exists(&entry_point_package_json_path) {
                return Ok(GetEntryPointResult::NoEntryPoint);
            }
            match loaded_entry_point_package_json {
                Some(json) => json,
                None => {
                    logger.warn(&format!(
                        "Failed to read entry point info from invalid 'package.json' file: {}",
                        entry_point_package_json_path
                    ));
                    return Ok(GetEntryPointResult::Invalid);
                }
            }
        }
        Some(config) if config.ignore => return Ok(GetEntryPointResult::Ignored),
        Some(config) => merge_config_and_package_json(
            fs,
            loaded_entry_point_package_json.as_ref(),
            config,
            package_path,
            entry_point_path,
        ),
    };

    let typings = match string_field(&package_json, "typings")
        .or_else(|| string_field(&package_json, "types"))
        .map(|t| fs.resolve(&[entry_point_path.as_str(), t]))
        .or_else(|| guess_typings_from_package_json(fs, entry_point_path, &package_json))
    {
        Some(typings) => typings,
        None => return Ok(GetEntryPointResult::Invalid),
    };

    let metadata_path = AbsoluteFsPath::new(format!(
        "{}.metadata.json",
        typings.as_str().strip_suffix(".d.ts").unwrap_or(typings.as_str())
    ));
    let compiled_by_angular = entry_point_config.is_some() || fs.exists(&metadata_path);

    Ok(GetEntryPointResult::Found(Box::new(EntryPoint {
        name: string_field(&package_json, "name")
            .map(str::to_string)
            .unwrap_or_else(|| package_name.clone()),
        path: entry_point_path.clone(),
        package_name,
        package_version,
        package_path: package_path.clone(),
        typings,
        compiled_by_angular,
        ignore_missing_dependencies: entry_point_config.map_or(false, |c| c.ignore_missing_dependencies),
        generate_deep_reexports: entry_point_config.map_or(false, |c| c.generate_deep_reexports),
        package_json,
    })))
}

/// Read and parse a `package.json`; `None` when it is absent, unparsable or not an object.
pub fn load_package_json(fs: &dyn FileSystem, path: &AbsoluteFsPath) -> Option<PackageJson> {
    let contents = fs.read_file(path).ok()?;
    match serde_json::from_str::<Value>(&contents).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Shallow merge: every top-level key of the override replaces the manifest's key.
pub fn merge_config_and_package_json(
    fs: &dyn FileSystem,
    package_json: Option<&PackageJson>,
    config: &EntryPointConfig,
    package_path: &AbsoluteFsPath,
    entry_point_path: &AbsoluteFsPath,
) -> PackageJson {
    let mut merged = match package_json {
        Some(json) => json.clone(),
        None => {
            let name = format!(
                "{}/{}",
                fs.basename(package_path.as_str(), None),
                fs.relative(package_path.as_str(), entry_point_path.as_str())
            );
            let mut base = Map::new();
            base.insert("name".to_string(), Value::String(name));
            base
        }
    };
    if let Some(override_) = &config.override_ {
        for (key, value) in override_ {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// The first format property whose `.js` file has a sibling `.d.ts` on disk.
pub fn guess_typings_from_package_json(
    fs: &dyn FileSystem,
    entry_point_path: &AbsoluteFsPath,
    package_json: &PackageJson,
) -> Option<AbsoluteFsPath> {
    SUPPORTED_FORMAT_PROPERTIES.iter().find_map(|property| {
        let field = string_field(package_json, property.as_str())?;
        let relative = match field.strip_suffix(".js") {
            Some(stem) => format!("{}.d.ts", stem),
            None => field.to_string(),
        };
        let typings = fs.resolve(&[entry_point_path.as_str(), &relative]);
        fs.exists(&typings).then_some(typings)
    })
}

fn get_package_name_and_version(
    fs: &dyn FileSystem,
    package_path: &AbsoluteFsPath,
    package_package_json: Option<&PackageJson>,
) -> (String, Option<String>) {
    if let Some(json) = package_package_json {
        if let Some(name) = string_field(json, "name") {
            return (
                name.to_string(),
                string_field(json, "version").map(str::to_string),
            );
        }
    }
    (guess_package_name(fs, package_path), None)
}

/// `node_modules/<name>` or `node_modules/@scope/<name>`, else the directory name.
fn guess_package_name(fs: &dyn FileSystem, package_path: &AbsoluteFsPath) -> String {
    let path = package_path.as_str();
    if let Some(idx) = path.rfind("/node_modules/") {
        let segments: Vec<&str> = path[idx + "/node_modules/".len()..].split('/').collect();
        if segments.len() >= 2 && segments[0].starts_with('@') {
            return format!("{}/{}", segments[0], segments[1]);
        }
        return segments[0].to_string();
    }
    fs.basename(path, None).as_str().to_string()
}

fn string_field<'j>(json: &'j PackageJson, key: &str) -> Option<&'j str> {
    json.get(key).and_then(Value::as_str)
}

/// Work out which module format the bundle behind `property` uses.
pub fn get_entry_point_format(
    fs: &dyn FileSystem,
    entry_point: &EntryPoint,
    property: EntryPointJsonProperty,
) -> Option<EntryPointFormat> {
    match property {
        EntryPointJsonProperty::Fesm2015
        | EntryPointJsonProperty::Es2015
        | EntryPointJsonProperty::Esm2015 => Some(EntryPointFormat::Esm2015),
        EntryPointJsonProperty::Fesm5 | EntryPointJsonProperty::Esm5 => Some(EntryPointFormat::Esm5),
        EntryPointJsonProperty::Module => {
            let module = entry_point.format_path(property)?;
            Some(if module.contains("esm2015") {
                EntryPointFormat::Esm2015
            } else {
                EntryPointFormat::Esm5
            })
        }
        EntryPointJsonProperty::Main | EntryPointJsonProperty::Browser => {
            let file = entry_point.format_path(property)?;
            sniff_module_format(fs, &fs.resolve(&[entry_point.path.as_str(), file]))
        }
    }
}

fn sniff_module_format(fs: &dyn FileSystem, source_path: &AbsoluteFsPath) -> Option<EntryPointFormat> {
    let resolved = resolve_file_with_postfixes(fs, source_path, &["", ".js", "/index.js"])?;
    let contents = fs.read_file(&resolved).ok()?;

    let allocator = Allocator::default();
    let source_type = SourceType::from_path(resolved.as_path())
        .unwrap_or_default()
        .with_module(true);
    let ret = Parser::new(&allocator, &contents, source_type).parse();
    let body = &ret.program.body;

    let first = body.first()?;
    let is_external_module = body.iter().any(|stmt| {
        matches!(
            stmt,
            Statement::ImportDeclaration(_)
                | Statement::ExportNamedDeclaration(_)
                | Statement::ExportDefaultDeclaration(_)
                | Statement::ExportAllDeclaration(_)
        )
    });
    if is_external_module {
        Some(EntryPointFormat::Esm5)
    } else if is_umd_wrapper(first) {
        Some(EntryPointFormat::Umd)
    } else {
        Some(EntryPointFormat::CommonJs)
    }
}

/// `(function (root, factory) { ... })(this, function (...) { ... })`, optionally negated.
fn is_umd_wrapper(stmt: &Statement<'_>) -> bool {
    let expression = match stmt {
        Statement::ExpressionStatement(s) => strip_wrappers(&s.expression),
        _ => return false,
    };
    let call = match expression {
        Expression::CallExpression(call) => call,
        _ => return false,
    };
    let wrapper_fn = match strip_wrappers(&call.callee) {
        Expression::FunctionExpression(f) => f,
        _ => return false,
    };
    let factory_index = wrapper_fn.params.items.iter().position(|param| {
        param
            .pattern
            .get_identifier_name()
            .map_or(false, |name| name.as_str() == "factory")
    });
    let factory_arg = match factory_index.and_then(|idx| call.arguments.get(idx)) {
        Some(arg) => arg,
        None => return false,
    };
    match factory_arg {
        Argument::FunctionExpression(_) => true,
        other => other
            .as_expression()
            .map_or(false, |e| matches!(strip_wrappers(e), Expression::FunctionExpression(_))),
    }
}

fn strip_wrappers<'e, 'a>(expression: &'e Expression<'a>) -> &'e Expression<'a> {
    match expression {
        Expression::ParenthesizedExpression(e) => strip_wrappers(&e.expression),
        Expression::UnaryExpression(e) => strip_wrappers(&e.argument),
        other => other,
    }
}
