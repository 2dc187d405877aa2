pub mod directory_walker_entry_point_finder;
pub mod interface;
pub mod targeted_entry_point_finder;
pub mod utils;

pub use directory_walker_entry_point_finder::*;
pub use interface::*;
pub use targeted_entry_point_finder::*;
pub use utils::*;
