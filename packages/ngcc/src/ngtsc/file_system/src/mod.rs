pub mod node_js_file_system;
pub mod types;
pub mod util;

pub use node_js_file_system::*;
pub use types::*;
pub use util::*;
