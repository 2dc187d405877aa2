use crate::dependencies::{default_dependency_hosts, DependencyHost, DependencyResolver, ImportSyntax};
use crate::entry_point_finder::{DirectoryWalkerEntryPointFinder, EntryPointFinder};
use crate::ngtsc::file_system::testing::MockFileSystem;
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem, ReadonlyFileSystem};
use crate::ngtsc::logging::testing::MockLogger;
use crate::packages::{
    EntryPointManifest, FileSystemEntryPointManifest, InvalidatingEntryPointManifest,
    NgccConfiguration,
};

fn p(path: &str) -> AbsoluteFsPath {
    AbsoluteFsPath::new(path)
}

/// An entry-point at `dir` named `name`; `angular` adds the metadata file.
fn add_entry_point(fs: &MockFileSystem, dir: &str, name: &str, angular: bool, imports: &[&str]) {
    let bundle: String = imports
        .iter()
        .map(|import| format!("import '{}';\n", import))
        .collect();
    let mut files = vec![
        (
            format!("{}/package.json", dir),
            format!(
                r#"{{"name": "{}", "typings": "./index.d.ts", "fesm2015": "./index.js"}}"#,
                name
            ),
        ),
        (format!("{}/index.js", dir), bundle),
        (format!("{}/index.d.ts", dir), String::new()),
    ];
    if angular {
        files.push((format!("{}/index.metadata.json", dir), "{}".to_string()));
    }
    fs.init_with_files(
        files
            .iter()
            .map(|(path, contents)| (path.as_str(), contents.as_str()))
            .collect(),
    );
}

fn init_fs() -> MockFileSystem {
    let fs = MockFileSystem::new_posix();
    fs.init_with_files(vec![
        ("/project/yarn.lock", "lock"),
        ("/project/node_modules/.bin/tool", ""),
    ]);
    add_entry_point(&fs, "/project/node_modules/a", "a", true, &["b", "@scope/d"]);
    add_entry_point(&fs, "/project/node_modules/b", "b", true, &[]);
    add_entry_point(&fs, "/project/node_modules/b/testing", "b/testing", true, &["b"]);
    add_entry_point(&fs, "/project/node_modules/c", "c", false, &[]);
    add_entry_point(&fs, "/project/node_modules/@scope/d", "@scope/d", true, &[]);
    fs
}

/// Run a directory walk over `/project/node_modules` and return the sorted entry-point names.
fn walk(fs: &MockFileSystem, logger: &MockLogger, invalidate: bool) -> Vec<String> {
    let config = NgccConfiguration::new(fs, &p("/project")).unwrap();
    let resolver = DependencyResolver::new(
        fs,
        logger,
        &config,
        default_dependency_hosts(fs, None),
        DependencyHost::new(ImportSyntax::Dts, fs, None),
    );
    let file_system_manifest = FileSystemEntryPointManifest::new(fs, &config, logger);
    let invalidating_manifest = InvalidatingEntryPointManifest::new(fs, &config, logger);
    let manifest: &dyn EntryPointManifest = if invalidate {
        &invalidating_manifest
    } else {
        &file_system_manifest
    };
    let finder = DirectoryWalkerEntryPointFinder::new(
        fs,
        &config,
        logger,
        &resolver,
        manifest,
        &p("/project/node_modules"),
        None,
    );

    finder
        .find_entry_points()
        .unwrap()
        .entry_points
        .into_iter()
        .map(|e| e.name)
        .collect()
}

#[test]
fn should_find_sorted_angular_entry_points() {
    let fs = init_fs();
    let logger = MockLogger::new();

    assert_eq!(walk(&fs, &logger, false), vec!["@scope/d", "b", "a", "b/testing"]);
}

#[test]
fn should_skip_packages_with_invalid_package_json() {
    let fs = init_fs();
    fs.init_with_files(vec![("/project/node_modules/broken/package.json", "{ oops")]);
    add_entry_point(&fs, "/project/node_modules/broken/sub", "broken/sub", true, &[]);
    let logger = MockLogger::new();

    let names = walk(&fs, &logger, false);
    assert!(!names.iter().any(|n| n.starts_with("broken")));
}

#[test]
fn should_walk_folders_without_package_json() {
    let fs = init_fs();
    add_entry_point(&fs, "/project/node_modules/e/lib/inner", "e/inner", true, &[]);
    fs.init_with_files(vec![("/project/node_modules/e/README.md", "")]);
    let logger = MockLogger::new();

    assert!(walk(&fs, &logger, false).contains(&"e/inner".to_string()));
}

#[test]
fn should_not_descend_into_code_folders() {
    let fs = init_fs();
    fs.init_with_files(vec![("/project/node_modules/b/src/helper.js", "")]);
    add_entry_point(&fs, "/project/node_modules/b/src/hidden", "b/hidden", true, &[]);
    let logger = MockLogger::new();

    assert!(!walk(&fs, &logger, false).contains(&"b/hidden".to_string()));
}

#[test]
fn should_skip_symlinked_packages() {
    let fs = init_fs();
    add_entry_point(&fs, "/elsewhere/linked", "linked", true, &[]);
    fs.symlink(&p("/elsewhere/linked"), &p("/project/node_modules/linked"))
        .unwrap();
    let logger = MockLogger::new();

    assert!(!walk(&fs, &logger, false).contains(&"linked".to_string()));
}

#[test]
fn should_only_walk_nested_node_modules_of_angular_packages() {
    let fs = init_fs();
    add_entry_point(&fs, "/project/node_modules/a/node_modules/nested-a", "nested-a", true, &[]);
    add_entry_point(&fs, "/project/node_modules/c/node_modules/nested-c", "nested-c", true, &[]);
    let logger = MockLogger::new();

    let names = walk(&fs, &logger, false);
    assert!(names.contains(&"nested-a".to_string()));
    assert!(!names.contains(&"nested-c".to_string()));
}

#[test]
fn should_write_and_then_use_the_manifest() {
    let fs = init_fs();
    let logger = MockLogger::new();
    let first = walk(&fs, &logger, false);
    assert!(fs.exists(&p("/project/node_modules/__ngcc_entry_points__.json")));

    // Invisible to a manifest-backed run until the lock file changes.
    add_entry_point(&fs, "/project/node_modules/late", "late", true, &[]);
    let logger = MockLogger::new();
    assert_eq!(walk(&fs, &logger, false), first);
    assert!(logger
        .debug_logs()
        .iter()
        .any(|m| m.contains("Entry-point manifest found")));

    let logger = MockLogger::new();
    assert!(walk(&fs, &logger, true).contains(&"late".to_string()));

    fs.write_file(&p("/project/yarn.lock"), b"changed", None).unwrap();
    let logger = MockLogger::new();
    assert!(walk(&fs, &logger, false).contains(&"late".to_string()));
}

#[test]
fn should_not_write_a_manifest_when_the_walk_fails() {
    let fs = init_fs();
    fs.init_with_files(vec![(
        "/project/ngcc.config.json",
        r#"{"packages": {"a": {"ignorableDeepImportMatchers": ["("]}}}"#,
    )]);
    let logger = MockLogger::new();
    let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
    let resolver = DependencyResolver::new(
        &fs,
        &logger,
        &config,
        default_dependency_hosts(&fs, None),
        DependencyHost::new(ImportSyntax::Dts, &fs, None),
    );
    let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);
    let finder = DirectoryWalkerEntryPointFinder::new(
        &fs,
        &config,
        &logger,
        &resolver,
        &manifest,
        &p("/project/node_modules"),
        None,
    );

    assert!(finder.find_entry_points().is_err());
    assert!(!fs.exists(&p("/project/node_modules/__ngcc_entry_points__.json")));
}
