//! Logging used by the entry-point tooling.

pub mod src;
pub mod testing;


pub use src::*;
