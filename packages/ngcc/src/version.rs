//! Version

/// The ngcc version, recorded in build markers and the entry-point manifest.
pub const NGCC_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version string printed by the CLI.
pub fn version_string() -> String {
    format!("Angular Compatibility Compiler v{}", NGCC_VERSION)
}
