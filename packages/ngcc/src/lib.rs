#![deny(clippy::all)]

/**
 * Angular Compatibility Compiler - Rust Implementation
 *
 * Entry-point discovery, dependency ordering and task scheduling for compiling
 * npm packages in dependency order.
 */
pub mod dependencies;
pub mod entry_point_finder;
pub mod error;
pub mod execution;
pub mod main_entry;
pub mod ngcc_options;
pub mod ngtsc;
pub mod packages;
pub mod path_mappings;
pub mod utils;
pub mod version;

pub use error::{NgccError, NgccResult};
