pub mod build_marker;
pub mod configuration;
pub mod entry_point;
pub mod entry_point_manifest;

pub use build_marker::*;
pub use configuration::*;
pub use entry_point::*;
pub use entry_point_manifest::*;
