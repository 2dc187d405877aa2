use crate::error::NgccError;
use crate::ngtsc::file_system::testing::MockFileSystem;
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::packages::*;
use crate::utils::hash_contents;

fn p(path: &str) -> AbsoluteFsPath {
    AbsoluteFsPath::new(path)
}

mod ngcc_configuration {
    use super::*;

    #[test]
    fn should_hash_the_project_configuration() {
        let fs = MockFileSystem::new_posix();
        let contents = r#"{"packages": {}}"#;
        fs.init_with_files(vec![("/project/ngcc.config.json", contents)]);

        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        assert_eq!(config.hash, hash_contents(contents.as_bytes()));

        let empty = NgccConfiguration::new(&fs, &p("/other")).unwrap();
        assert_eq!(empty.hash, hash_contents(b""));
        assert_ne!(config.hash, empty.hash);
    }

    #[test]
    fn should_reject_unparsable_project_configuration() {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![("/project/ngcc.config.json", "{ packages: ")]);
        assert!(matches!(
            NgccConfiguration::new(&fs, &p("/project")),
            Err(NgccError::Json { .. })
        ));
    }

    #[test]
    fn should_return_an_empty_config_for_unknown_packages() {
        let fs = MockFileSystem::new_posix();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();

        let package_config = config
            .get_package_config("unknown", &p("/project/node_modules/unknown"), Some("1.0.0"))
            .unwrap();
        assert!(package_config.entry_points.is_empty());
        assert!(package_config.ignorable_deep_import_matchers.is_empty());
        assert_eq!(package_config.version_range, "*");
    }
}

mod get_package_config {
    use super::*;

    fn init_fs() -> MockFileSystem {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![
            (
                "/project/node_modules/package-1/ngcc.config.json",
                r#"{"entryPoints": {"./sub": {"ignore": true}}, "ignorableDeepImportMatchers": ["internal"]}"#,
            ),
            ("/project/node_modules/package-1/package.json", "{}"),
        ]);
        fs
    }

    #[test]
    fn should_read_package_level_configuration() {
        let fs = init_fs();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();

        let package_config = config
            .get_package_config("package-1", &p("/project/node_modules/package-1"), None)
            .unwrap();
        assert_eq!(
            package_config.entry_points.get(&p("/project/node_modules/package-1/sub")),
            Some(&EntryPointConfig {
                ignore: true,
                ..EntryPointConfig::default()
            })
        );
        assert!(package_config.is_ignorable_deep_import(&p("/node_modules/x/internal/y")));
        assert!(!package_config.is_ignorable_deep_import(&p("/node_modules/x/public")));
    }

    #[test]
    fn should_prefer_project_configuration() {
        let fs = init_fs();
        fs.init_with_files(vec![(
            "/project/ngcc.config.json",
            r#"{"packages": {"package-1": {"entryPoints": {"./other": {"ignoreMissingDependencies": true}}}}}"#,
        )]);
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();

        let package_config = config
            .get_package_config("package-1", &p("/project/node_modules/package-1"), None)
            .unwrap();
        let keys: Vec<&AbsoluteFsPath> = package_config.entry_points.keys().collect();
        assert_eq!(keys, vec![&p("/project/node_modules/package-1/other")]);
        assert!(package_config.ignorable_deep_import_matchers.is_empty());
    }

    #[test]
    fn should_fall_back_to_the_default_configuration() {
        let fs = MockFileSystem::new_posix();
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();

        let package_config = config
            .get_package_config(
                "angular2-highcharts",
                &p("/project/node_modules/angular2-highcharts"),
                Some("0.5.5"),
            )
            .unwrap();
        let entry_point = package_config
            .entry_points
            .get(&p("/project/node_modules/angular2-highcharts"))
            .expect("default entry-point config");
        let main = entry_point
            .override_
            .as_ref()
            .and_then(|o| o.get("main"))
            .and_then(|v| v.as_str());
        assert_eq!(main, Some("./index.js"));
    }

    #[test]
    fn should_select_configuration_by_version_range() {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![(
            "/project/ngcc.config.json",
            r#"{"packages": {
                "@scope/lib@^1.0.0": {"entryPoints": {"./v1": {}}},
                "@scope/lib@>=2.0.0 <3.0.0 || ^4.0.0": {"entryPoints": {"./v2": {}}}
            }}"#,
        )]);
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        let package_path = p("/project/node_modules/@scope/lib");
        let entry_point_names = |version: Option<&str>| -> Vec<String> {
            config
                .get_package_config("@scope/lib", &package_path, version)
                .unwrap()
                .entry_points
                .keys()
                .map(|k| k.as_str().to_string())
                .collect()
        };

        assert_eq!(entry_point_names(Some("1.4.0")), vec!["/project/node_modules/@scope/lib/v1"]);
        assert_eq!(entry_point_names(Some("2.1.0")), vec!["/project/node_modules/@scope/lib/v2"]);
        assert_eq!(entry_point_names(Some("4.2.0")), vec!["/project/node_modules/@scope/lib/v2"]);
        assert!(entry_point_names(Some("3.0.0")).is_empty());
        assert_eq!(entry_point_names(None), vec!["/project/node_modules/@scope/lib/v1"]);
    }

    #[test]
    fn should_reject_invalid_deep_import_matchers() {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![(
            "/project/node_modules/package-1/ngcc.config.json",
            r#"{"ignorableDeepImportMatchers": ["("]}"#,
        )]);
        let config = NgccConfiguration::new(&fs, &p("/project")).unwrap();
        assert!(matches!(
            config.get_package_config("package-1", &p("/project/node_modules/package-1"), None),
            Err(NgccError::InvalidConfiguration { .. })
        ));
    }
}

#[test]
fn should_match_npm_style_version_ranges() {
    assert!(satisfies("1.2.3", "*"));
    assert!(satisfies("1.2.3", "^1.0.0"));
    assert!(!satisfies("2.0.0", "^1.0.0"));
    assert!(satisfies("2.5.0", ">=2.0.0 <3.0.0"));
    assert!(satisfies("5.0.0", "^4.0.0 || ^5.0.0"));
    assert!(!satisfies("not-a-version", "*"));
}
