use crate::ngtsc::file_system::testing::MockFileSystem;
use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem, ReadonlyFileSystem};
use crate::ngtsc::logging::testing::MockLogger;
use crate::packages::*;
use crate::utils::hash_contents;
use crate::version::NGCC_VERSION;

fn p(path: &str) -> AbsoluteFsPath {
    AbsoluteFsPath::new(path)
}

const LOCK_FILE: &str = "# lock file contents";

fn init_fs() -> MockFileSystem {
    let fs = MockFileSystem::new_posix();
    fs.init_with_files(vec![
        ("/project/yarn.lock", LOCK_FILE),
        (
            "/project/node_modules/some_package/package.json",
            r#"{"name": "some_package", "typings": "./index.d.ts", "fesm2015": "./index.js"}"#,
        ),
        ("/project/node_modules/some_package/index.d.ts", ""),
        ("/project/node_modules/some_package/index.metadata.json", "{}"),
        (
            "/project/node_modules/some_package/sub/package.json",
            r#"{"name": "some_package/sub", "typings": "./sub.d.ts"}"#,
        ),
        ("/project/node_modules/some_package/sub/sub.d.ts", ""),
    ]);
    fs
}

fn entry_point(fs: &MockFileSystem, config: &NgccConfiguration<'_>, path: &str) -> EntryPoint {
    let logger = MockLogger::new();
    match get_entry_point_info(fs, config, &logger, &p("/project/node_modules/some_package"), &p(path))
        .unwrap()
    {
        GetEntryPointResult::Found(entry_point) => *entry_point,
        other => panic!("expected an entry-point, got {:?}", other),
    }
}

fn manifest_file(fs: &MockFileSystem) -> EntryPointManifestFile {
    let contents = fs
        .read_file(&p("/project/node_modules/__ngcc_entry_points__.json"))
        .unwrap();
    serde_json::from_str(&contents).unwrap()
}

mod write_entry_point_manifest {
    use super::*;

    #[test]
    fn should_write_fingerprint_and_summaries() {
        let fs = init_fs();
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);
        let entry_points = vec![
            entry_point(&fs, &config, "/project/node_modules/some_package"),
            entry_point(&fs, &config, "/project/node_modules/some_package/sub"),
        ];

        manifest
            .write_entry_point_manifest(&p("/project/node_modules"), &entry_points)
            .unwrap();

        let file = manifest_file(&fs);
        assert_eq!(file.ngcc_version, NGCC_VERSION);
        assert_eq!(file.config_file_hash, config.hash);
        assert_eq!(file.lock_file_hash, hash_contents(LOCK_FILE.as_bytes()));
        assert_eq!(
            file.entry_point_paths,
            vec![
                EntryPointSummary {
                    package_path: p("/project/node_modules/some_package"),
                    entry_point_path: p("/project/node_modules/some_package"),
                    compiled_by_angular: true,
                    ignore_missing_dependencies: false,
                    generate_deep_reexports: false,
                },
                EntryPointSummary {
                    package_path: p("/project/node_modules/some_package"),
                    entry_point_path: p("/project/node_modules/some_package/sub"),
                    compiled_by_angular: false,
                    ignore_missing_dependencies: false,
                    generate_deep_reexports: false,
                },
            ]
        );
        assert!(!fs.exists(&p("/project/node_modules/__ngcc_entry_points__.json.__tmp__")));
    }

    #[test]
    fn should_use_camel_case_keys() {
        let fs = init_fs();
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);
        let entry_points = vec![entry_point(&fs, &config, "/project/node_modules/some_package")];
        manifest
            .write_entry_point_manifest(&p("/project/node_modules"), &entry_points)
            .unwrap();

        let raw = fs
            .read_file(&p("/project/node_modules/__ngcc_entry_points__.json"))
            .unwrap();
        for key in ["ngccVersion", "configFileHash", "lockFileHash", "entryPointPaths", "packagePath", "entryPointPath"] {
            assert!(raw.contains(&format!("\"{}\"", key)), "missing key {}", key);
        }
    }

    #[test]
    fn should_skip_base_paths_that_are_not_node_modules() {
        let fs = init_fs();
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);

        manifest
            .write_entry_point_manifest(&p("/project/node_modules/some_package"), &[])
            .unwrap();
        assert!(!fs.exists(&p(
            "/project/node_modules/some_package/__ngcc_entry_points__.json"
        )));
    }

    #[test]
    fn should_skip_projects_without_a_lock_file() {
        let fs = init_fs();
        fs.remove_file(&p("/project/yarn.lock")).unwrap();
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);

        manifest
            .write_entry_point_manifest(&p("/project/node_modules"), &[])
            .unwrap();
        assert!(!fs.exists(&p("/project/node_modules/__ngcc_entry_points__.json")));
    }
}

mod read_entry_points_using_manifest {
    use super::*;

    fn write_manifest(fs: &MockFileSystem) -> Vec<EntryPoint> {
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(fs, &config, &logger);
        let entry_points = vec![
            entry_point(fs, &config, "/project/node_modules/some_package"),
            entry_point(fs, &config, "/project/node_modules/some_package/sub"),
        ];
        manifest
            .write_entry_point_manifest(&p("/project/node_modules"), &entry_points)
            .unwrap();
        entry_points
    }

    #[test]
    fn should_round_trip_entry_points() {
        let fs = init_fs();
        let written = write_manifest(&fs);
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);

        let read = manifest
            .read_entry_points_using_manifest(&p("/project/node_modules"))
            .unwrap()
            .expect("manifest hit");
        assert_eq!(read, written);
    }

    #[test]
    fn should_miss_when_the_lock_file_changed() {
        let fs = init_fs();
        write_manifest(&fs);
        fs.write_file(&p("/project/yarn.lock"), b"# changed", None).unwrap();
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);

        assert_eq!(
            manifest
                .read_entry_points_using_manifest(&p("/project/node_modules"))
                .unwrap(),
            None
        );
        assert!(logger.debug_logs().iter().any(|m| m.contains("out of date")));
    }

    #[test]
    fn should_miss_when_the_project_configuration_changed() {
        let fs = init_fs();
        write_manifest(&fs);
        fs.init_with_files(vec![("/project/ngcc.config.json", r#"{"packages": {}}"#)]);
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);

        assert_eq!(
            manifest
                .read_entry_points_using_manifest(&p("/project/node_modules"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn should_warn_and_miss_on_an_unparsable_manifest() {
        let fs = init_fs();
        fs.init_with_files(vec![(
            "/project/node_modules/__ngcc_entry_points__.json",
            "not json",
        )]);
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);

        assert_eq!(
            manifest
                .read_entry_points_using_manifest(&p("/project/node_modules"))
                .unwrap(),
            None
        );
        assert_eq!(logger.warn_logs().len(), 1);
    }

    #[test]
    fn should_miss_when_an_entry_point_disappeared() {
        let fs = init_fs();
        write_manifest(&fs);
        fs.remove_deep(&p("/project/node_modules/some_package/sub")).unwrap();
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);

        assert_eq!(
            manifest
                .read_entry_points_using_manifest(&p("/project/node_modules"))
                .unwrap(),
            None
        );
        assert!(logger.warn_logs()[0].contains("contained an invalid pair of package paths"));
    }

    #[test]
    fn should_miss_when_a_flag_changed() {
        let fs = init_fs();
        write_manifest(&fs);
        fs.remove_file(&p("/project/node_modules/some_package/index.metadata.json"))
            .unwrap();
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = FileSystemEntryPointManifest::new(&fs, &config, &logger);

        assert_eq!(
            manifest
                .read_entry_points_using_manifest(&p("/project/node_modules"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn should_never_read_with_the_invalidating_manifest() {
        let fs = init_fs();
        write_manifest(&fs);
        let logger = MockLogger::new();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let manifest = InvalidatingEntryPointManifest::new(&fs, &config, &logger);

        assert_eq!(
            manifest
                .read_entry_points_using_manifest(&p("/project/node_modules"))
                .unwrap(),
            None
        );

        fs.remove_file(&p("/project/node_modules/__ngcc_entry_points__.json"))
            .unwrap();
        manifest
            .write_entry_point_manifest(&p("/project/node_modules"), &[])
            .unwrap();
        assert!(manifest_file(&fs).entry_point_paths.is_empty());
    }
}
