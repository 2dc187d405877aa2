pub mod mock_file_system;
pub mod mock_file_system_posix;

pub use mock_file_system::*;
pub use mock_file_system_posix::*;
