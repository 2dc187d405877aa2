pub mod file_system;
pub mod logging;
