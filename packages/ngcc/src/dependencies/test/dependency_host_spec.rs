use crate::dependencies::{DependencyHost, DependencyInfo, ImportSyntax};
use crate::ngtsc::file_system::testing::MockFileSystem;
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::path_mappings::PathMappings;
use indexmap::IndexMap;
use std::collections::BTreeSet;

fn p(path: &str) -> AbsoluteFsPath {
    AbsoluteFsPath::new(path)
}

fn paths(items: &[&str]) -> BTreeSet<AbsoluteFsPath> {
    items.iter().map(|item| p(item)).collect()
}

fn strings(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

mod esm {
    use super::*;

    fn init_fs() -> MockFileSystem {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![
            (
                "/node_modules/test/index.js",
                "import * as a from 'lib-1';\nimport { b } from './internal';\nimport 'fs';\n",
            ),
            (
                "/node_modules/test/internal.js",
                "export * from 'lib-2/sub';\nexport { c } from 'missing';\nimport './index';\n",
            ),
            ("/node_modules/lib-1/package.json", "{}"),
            ("/node_modules/lib-1/index.js", ""),
            ("/node_modules/lib-2/package.json", "{}"),
            ("/node_modules/lib-2/sub/package.json", "{}"),
            ("/node_modules/lib-2/sub/index.js", ""),
            ("/node_modules/deep/package.json", "{}"),
            ("/node_modules/deep/internal/thing.js", ""),
            (
                "/node_modules/uses-deep/index.js",
                "import { x } from 'deep/internal/thing';\n",
            ),
        ]);
        fs
    }

    #[test]
    fn should_follow_internal_imports_and_record_entry_points() {
        let fs = init_fs();
        let host = DependencyHost::new(ImportSyntax::Esm, &fs, None);

        let info = host.collect_dependencies(&p("/node_modules/test/index.js"));
        assert_eq!(
            info.dependencies,
            paths(&["/node_modules/lib-1", "/node_modules/lib-2/sub"])
        );
        assert_eq!(info.missing, strings(&["missing"]));
        assert!(info.deep_imports.is_empty());
    }

    #[test]
    fn should_never_report_builtins_as_missing() {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![(
            "/node_modules/test/index.js",
            "import * as fs from 'fs';\nimport { join } from 'node:path';\nimport 'fs/promises';\n",
        )]);
        let host = DependencyHost::new(ImportSyntax::Esm, &fs, None);

        assert_eq!(
            host.collect_dependencies(&p("/node_modules/test/index.js")),
            DependencyInfo::default()
        );
    }

    #[test]
    fn should_record_deep_imports() {
        let fs = init_fs();
        let host = DependencyHost::new(ImportSyntax::Esm, &fs, None);

        let info = host.collect_dependencies(&p("/node_modules/uses-deep/index.js"));
        assert_eq!(info.deep_imports, paths(&["/node_modules/deep/internal/thing"]));
        assert!(info.dependencies.is_empty());
    }

    #[test]
    fn should_resolve_the_entry_file_with_postfixes() {
        let fs = init_fs();
        let host = DependencyHost::new(ImportSyntax::Esm, &fs, None);

        let info = host.collect_dependencies(&p("/node_modules/test/index"));
        assert!(info.dependencies.contains(&p("/node_modules/lib-1")));
        assert!(host
            .collect_dependencies(&p("/node_modules/test/missing-file"))
            .dependencies
            .is_empty());
    }

    #[test]
    fn should_use_path_mappings() {
        let fs = init_fs();
        fs.init_with_files(vec![
            ("/node_modules/mapped/package.json", "{}"),
            ("/node_modules/mapped/index.js", "import { y } from '@app/lib';\n"),
            ("/dist/lib/package.json", "{}"),
            ("/dist/lib/index.js", ""),
        ]);
        let mut table = IndexMap::new();
        table.insert("@app/*".to_string(), vec!["*".to_string()]);
        let mappings = PathMappings {
            base_url: p("/dist"),
            paths: table,
        };
        let host = DependencyHost::new(ImportSyntax::Esm, &fs, Some(&mappings));

        let info = host.collect_dependencies(&p("/node_modules/mapped/index.js"));
        assert_eq!(info.dependencies, paths(&["/dist/lib"]));
    }
}

mod umd_and_commonjs {
    use super::*;

    #[test]
    fn should_collect_umd_dependencies() {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![
            (
                "/node_modules/test/bundle.umd.js",
                "(function (global, factory) {\n  typeof exports === 'object' ? factory(exports, require('lib-1')) : factory(global.test = {}, global.lib1);\n})(this, function (exports, lib1) {});\n",
            ),
            ("/node_modules/lib-1/package.json", "{}"),
            ("/node_modules/lib-1/index.js", ""),
        ]);
        let host = DependencyHost::new(ImportSyntax::Umd, &fs, None);

        let info = host.collect_dependencies(&p("/node_modules/test/bundle.umd.js"));
        assert_eq!(info.dependencies, paths(&["/node_modules/lib-1"]));
    }

    #[test]
    fn should_follow_relative_commonjs_requires() {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![
            ("/node_modules/test/index.js", "var a = require('./a');\n"),
            ("/node_modules/test/a.js", "var lib = require('lib-1');\nvar gone = require('gone');\n"),
            ("/node_modules/lib-1/package.json", "{}"),
            ("/node_modules/lib-1/index.js", ""),
        ]);
        let host = DependencyHost::new(ImportSyntax::CommonJs, &fs, None);

        let info = host.collect_dependencies(&p("/node_modules/test/index.js"));
        assert_eq!(info.dependencies, paths(&["/node_modules/lib-1"]));
        assert_eq!(info.missing, strings(&["gone"]));
    }
}

mod dts {
    use super::*;

    #[test]
    fn should_resolve_typings_dependencies() {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![
            (
                "/node_modules/test/index.d.ts",
                "import type { A } from 'lib-1';\nexport * from './public_api';\n",
            ),
            ("/node_modules/test/public_api.d.ts", "export { B } from 'lib-2';\n"),
            ("/node_modules/lib-1/package.json", "{}"),
            ("/node_modules/lib-1/index.d.ts", ""),
            ("/node_modules/lib-2/package.json", "{}"),
            ("/node_modules/lib-2/index.d.ts", ""),
        ]);
        let host = DependencyHost::new(ImportSyntax::Dts, &fs, None);

        let info = host.collect_dependencies(&p("/node_modules/test/index.d.ts"));
        assert_eq!(
            info.dependencies,
            paths(&["/node_modules/lib-1", "/node_modules/lib-2"])
        );
        assert!(info.missing.is_empty());
    }
}

#[test]
fn should_merge_dependency_info() {
    let mut left = DependencyInfo::default();
    left.dependencies.insert(p("/a"));
    left.missing.insert("x".to_string());
    let mut right = DependencyInfo::default();
    right.dependencies.insert(p("/b"));
    right.deep_imports.insert(p("/c/deep"));

    left.merge(right);
    assert_eq!(left.dependencies, paths(&["/a", "/b"]));
    assert_eq!(left.missing, strings(&["x"]));
    assert_eq!(left.deep_imports, paths(&["/c/deep"]));
}
