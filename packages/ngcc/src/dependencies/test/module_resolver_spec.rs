use crate::dependencies::{ModuleResolver, ResolvedModule, JS_POSTFIXES};
use crate::ngtsc::file_system::testing::MockFileSystem;
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::path_mappings::PathMappings;
use indexmap::IndexMap;

fn p(path: &str) -> AbsoluteFsPath {
    AbsoluteFsPath::new(path)
}

fn init_fs() -> MockFileSystem {
    let fs = MockFileSystem::new_posix();
    fs.init_with_files(vec![
        ("/libs/local-package/package.json", "{}"),
        ("/libs/local-package/index.js", ""),
        ("/libs/local-package/sub-folder/index.js", ""),
        ("/libs/local-package/x.js", ""),
        ("/libs/local-package/node_modules/package-1/package.json", "{}"),
        ("/libs/local-package/node_modules/package-1/index.js", ""),
        ("/libs/local-package/node_modules/package-1/sub-folder/index.js", ""),
        ("/libs/node_modules/package-2/package.json", "{}"),
        ("/libs/node_modules/package-2/index.js", ""),
        ("/libs/node_modules/package-2/node_modules/package-3/package.json", "{}"),
        ("/libs/node_modules/package-2/node_modules/package-3/index.js", ""),
        ("/dist/package-4/package.json", "{}"),
        ("/dist/package-4/index.js", ""),
        ("/dist/package-4/sub-folder/index.js", ""),
        ("/dist/sub-folder/package-5/package.json", "{}"),
        ("/dist/sub-folder/package-5/index.js", ""),
    ]);
    fs
}

fn mappings(base_url: &str, paths: &[(&str, &[&str])]) -> PathMappings {
    let mut table = IndexMap::new();
    for (pattern, targets) in paths {
        table.insert(
            pattern.to_string(),
            targets.iter().map(|t| t.to_string()).collect(),
        );
    }
    PathMappings {
        base_url: p(base_url),
        paths: table,
    }
}

mod relative {
    use super::*;

    #[test]
    fn should_resolve_files_with_postfixes() {
        let fs = init_fs();
        let resolver = ModuleResolver::new(&fs, None, JS_POSTFIXES);
        let from = p("/libs/local-package/index.js");

        assert_eq!(
            resolver.resolve_module_import("./x", &from),
            Some(ResolvedModule::Relative(p("/libs/local-package/x.js")))
        );
        assert_eq!(
            resolver.resolve_module_import("./sub-folder", &from),
            Some(ResolvedModule::Relative(p("/libs/local-package/sub-folder/index.js")))
        );
        assert_eq!(
            resolver.resolve_module_import("../local-package/x.js", &from),
            Some(ResolvedModule::Relative(p("/libs/local-package/x.js")))
        );
    }

    #[test]
    fn should_return_none_for_missing_files() {
        let fs = init_fs();
        let resolver = ModuleResolver::new(&fs, None, JS_POSTFIXES);
        assert_eq!(
            resolver.resolve_module_import("./missing", &p("/libs/local-package/index.js")),
            None
        );
    }
}

mod node_modules {
    use super::*;

    #[test]
    fn should_find_the_nearest_entry_point() {
        let fs = init_fs();
        let resolver = ModuleResolver::new(&fs, None, JS_POSTFIXES);

        assert_eq!(
            resolver.resolve_module_import("package-1", &p("/libs/local-package/index.js")),
            Some(ResolvedModule::EntryPoint(p(
                "/libs/local-package/node_modules/package-1"
            )))
        );
        assert_eq!(
            resolver.resolve_module_import("package-2", &p("/libs/local-package/index.js")),
            Some(ResolvedModule::EntryPoint(p("/libs/node_modules/package-2")))
        );
        assert_eq!(
            resolver.resolve_module_import(
                "package-3",
                &p("/libs/node_modules/package-2/index.js")
            ),
            Some(ResolvedModule::EntryPoint(p(
                "/libs/node_modules/package-2/node_modules/package-3"
            )))
        );
    }

    #[test]
    fn should_not_look_inside_sibling_packages() {
        let fs = init_fs();
        let resolver = ModuleResolver::new(&fs, None, JS_POSTFIXES);
        assert_eq!(
            resolver.resolve_module_import("package-3", &p("/libs/local-package/index.js")),
            None
        );
    }

    #[test]
    fn should_report_deep_imports() {
        let fs = init_fs();
        let resolver = ModuleResolver::new(&fs, None, JS_POSTFIXES);
        assert_eq!(
            resolver.resolve_module_import(
                "package-1/sub-folder",
                &p("/libs/local-package/index.js")
            ),
            Some(ResolvedModule::DeepImport(p(
                "/libs/local-package/node_modules/package-1/sub-folder"
            )))
        );
    }

    #[test]
    fn should_treat_builtins_as_resolved() {
        let fs = init_fs();
        let resolver = ModuleResolver::new(&fs, None, JS_POSTFIXES);
        let from = p("/libs/local-package/index.js");
        assert_eq!(resolver.resolve_module_import("fs", &from), Some(ResolvedModule::Builtin));
        assert_eq!(
            resolver.resolve_module_import("node:path", &from),
            Some(ResolvedModule::Builtin)
        );
    }
}

mod path_mappings {
    use super::*;

    #[test]
    fn should_resolve_wildcard_mappings_to_entry_points() {
        let fs = init_fs();
        let mappings = mappings("/dist", &[("*", &["*", "sub-folder/*"])]);
        let resolver = ModuleResolver::new(&fs, Some(&mappings), JS_POSTFIXES);
        let from = p("/libs/local-package/index.js");

        assert_eq!(
            resolver.resolve_module_import("package-4", &from),
            Some(ResolvedModule::EntryPoint(p("/dist/package-4")))
        );
        assert_eq!(
            resolver.resolve_module_import("package-5", &from),
            Some(ResolvedModule::EntryPoint(p("/dist/sub-folder/package-5")))
        );
    }

    #[test]
    fn should_prefer_exact_matches() {
        let fs = init_fs();
        let mappings = mappings(
            "/dist",
            &[("@lib/*", &["sub-folder/*"]), ("@lib/package-4", &["package-4"])],
        );
        let resolver = ModuleResolver::new(&fs, Some(&mappings), JS_POSTFIXES);
        assert_eq!(
            resolver.resolve_module_import("@lib/package-4", &p("/libs/local-package/index.js")),
            Some(ResolvedModule::EntryPoint(p("/dist/package-4")))
        );
    }

    #[test]
    fn should_prefer_the_longest_wildcard_prefix() {
        let fs = init_fs();
        let mappings = mappings(
            "/dist",
            &[("@lib/*", &["missing/*"]), ("@lib/sub/*", &["sub-folder/*"])],
        );
        let resolver = ModuleResolver::new(&fs, Some(&mappings), JS_POSTFIXES);
        assert_eq!(
            resolver.resolve_module_import("@lib/sub/package-5", &p("/libs/local-package/index.js")),
            Some(ResolvedModule::EntryPoint(p("/dist/sub-folder/package-5")))
        );
    }

    #[test]
    fn should_report_mapped_files_in_other_packages_as_deep_imports() {
        let fs = init_fs();
        let mappings = mappings("/dist", &[("@lib/*", &["*"])]);
        let resolver = ModuleResolver::new(&fs, Some(&mappings), JS_POSTFIXES);
        assert_eq!(
            resolver.resolve_module_import(
                "@lib/package-4/sub-folder",
                &p("/libs/local-package/index.js")
            ),
            Some(ResolvedModule::DeepImport(p("/dist/package-4/sub-folder")))
        );
    }

    #[test]
    fn should_fall_back_to_node_modules() {
        let fs = init_fs();
        let mappings = mappings("/dist", &[("*", &["*"])]);
        let resolver = ModuleResolver::new(&fs, Some(&mappings), JS_POSTFIXES);
        assert_eq!(
            resolver.resolve_module_import("package-2", &p("/libs/local-package/index.js")),
            Some(ResolvedModule::EntryPoint(p("/libs/node_modules/package-2")))
        );
    }
}
