pub mod dep_graph;
pub mod dependency_host;
pub mod dependency_resolver;
pub mod import_extraction;
pub mod module_resolver;

pub use dep_graph::*;
pub use dependency_host::*;
pub use dependency_resolver::*;
pub use import_extraction::*;
pub use module_resolver::*;
