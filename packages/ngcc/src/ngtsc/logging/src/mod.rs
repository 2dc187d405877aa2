pub mod console_logger;
pub mod logger;

pub use console_logger::*;
pub use logger::*;
