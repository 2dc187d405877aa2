use once_cell::sync::Lazy;
use regex::Regex;

static TS_DTS_JS_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\.d\.ts|\.ts|\.js)$").unwrap());

/// Convert Windows-style separators to POSIX separators.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Remove a .ts, .d.ts, or .js extension from a file name.
pub fn strip_extension(path: &str) -> String {
    TS_DTS_JS_EXTENSION.replace(path, "").to_string()
}

/// Remove only a trailing `.js` extension.
pub fn strip_js_extension(path: &str) -> String {
    path.strip_suffix(".js").unwrap_or(path).to_string()
}

/// Whether `path` is a specifier relative to the importing file (`./x`, `../x`, `.`, `..`).
pub fn is_relative_path(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/')
}

/// Collapse `.` and `..` segments and duplicate separators.
///
/// `..` never climbs above the root of an absolute path.
pub fn clean_path(path: &str) -> String {
    let normalized = normalize_separators(path);

    let is_windows_absolute = normalized.len() >= 2 && normalized.as_bytes()[1] == b':';
    let is_unix_absolute = normalized.starts_with('/');

    let (drive_prefix, path_part) = if is_windows_absolute {
        (&normalized[0..2], &normalized[2..])
    } else {
        ("", normalized.as_str())
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in path_part.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.last().map_or(false, |last| *last != "..") {
                    segments.pop();
                } else if !is_unix_absolute && !is_windows_absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");

    if is_windows_absolute {
        format!("{}/{}", drive_prefix, joined)
    } else if is_unix_absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Compute the relative path from the directory `from` to `to`, both already cleaned.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segments: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segments: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let common = from_segments
        .iter()
        .zip(to_segments.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat("..").take(from_segments.len() - common));
    parts.extend(&to_segments[common..]);
    parts.join("/")
}
