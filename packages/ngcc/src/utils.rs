//! Helpers shared by the resolver, the finders and the manifest.

use crate::ngtsc::file_system::{AbsoluteFsPath, FileSystem};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use xxhash_rust::xxh3::xxh3_64;

static BUILTIN_MODULES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "assert",
        "async_hooks",
        "buffer",
        "child_process",
        "cluster",
        "console",
        "constants",
        "crypto",
        "dgram",
        "diagnostics_channel",
        "dns",
        "domain",
        "events",
        "fs",
        "http",
        "http2",
        "https",
        "inspector",
        "module",
        "net",
        "os",
        "path",
        "perf_hooks",
        "process",
        "punycode",
        "querystring",
        "readline",
        "repl",
        "stream",
        "string_decoder",
        "sys",
        "timers",
        "tls",
        "trace_events",
        "tty",
        "url",
        "util",
        "v8",
        "vm",
        "wasi",
        "worker_threads",
        "zlib",
    ]
    .into_iter()
    .collect()
});

/// Whether `specifier` names a module provided by the Node.js runtime (`fs`, `node:path`, `fs/promises`).
pub fn is_builtin_module(specifier: &str) -> bool {
    if let Some(rest) = specifier.strip_prefix("node:") {
        return !rest.is_empty();
    }
    let root = specifier.split('/').next().unwrap_or(specifier);
    BUILTIN_MODULES.contains(root)
}

/// Try `path` with each postfix appended, returning the first candidate that is a file.
pub fn resolve_file_with_postfixes(
    fs: &dyn FileSystem,
    path: &AbsoluteFsPath,
    postfixes: &[&str],
) -> Option<AbsoluteFsPath> {
    postfixes.iter().find_map(|postfix| {
        let candidate = AbsoluteFsPath::new(format!("{}{}", path.as_str(), postfix));
        match fs.stat(&candidate) {
            Ok(stats) if stats.is_file() => Some(candidate),
            _ => None,
        }
    })
}

/// Whether `to` lives inside `from` (a relative path that does not climb out of it).
pub fn is_within(fs: &dyn FileSystem, from: &AbsoluteFsPath, to: &AbsoluteFsPath) -> bool {
    let relative = fs.relative(from.as_str(), to.as_str());
    !relative.starts_with("..") && !fs.is_rooted(&relative)
}

/// Strip comment lines from JSON-with-comments files such as `tsconfig.json`.
pub fn strip_json_comments(input: &str) -> String {
    let mut result = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*') {
            result.push_str(line);
            result.push('\n');
        }
    }
    result
}

/// Hex digest of `contents`, used for configuration and lock-file fingerprints.
pub fn hash_contents(contents: &[u8]) -> String {
    format!("{:016x}", xxh3_64(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngtsc::file_system::testing::MockFileSystem;

    #[test]
    fn should_recognise_builtin_modules() {
        assert!(is_builtin_module("fs"));
        assert!(is_builtin_module("fs/promises"));
        assert!(is_builtin_module("node:events"));
        assert!(!is_builtin_module("lodash"));
        assert!(!is_builtin_module("@angular/core"));
    }

    #[test]
    fn should_resolve_with_postfixes_in_order() {
        let fs = MockFileSystem::new_posix();
        fs.init_with_files(vec![("/lib/a.js", ""), ("/lib/b/index.js", "")]);
        let postfixes = ["", ".js", "/index.js"];

        assert_eq!(
            resolve_file_with_postfixes(&fs, &AbsoluteFsPath::new("/lib/a"), &postfixes),
            Some(AbsoluteFsPath::new("/lib/a.js"))
        );
        assert_eq!(
            resolve_file_with_postfixes(&fs, &AbsoluteFsPath::new("/lib/b"), &postfixes),
            Some(AbsoluteFsPath::new("/lib/b/index.js"))
        );
        assert_eq!(
            resolve_file_with_postfixes(&fs, &AbsoluteFsPath::new("/lib/c"), &postfixes),
            None
        );
    }

    #[test]
    fn should_strip_comment_lines() {
        let input = "{\n  // comment\n  \"a\": 1\n}";
        let parsed: serde_json::Value = serde_json::from_str(&strip_json_comments(input)).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn should_hash_deterministically() {
        assert_eq!(hash_contents(b"lock"), hash_contents(b"lock"));
        assert_ne!(hash_contents(b"lock"), hash_contents(b"lock2"));
        assert_eq!(hash_contents(b"x").len(), 16);
    }
}
