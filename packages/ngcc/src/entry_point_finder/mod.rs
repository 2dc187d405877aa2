//! Discovery of the entry-points to process.

pub mod src;

#[cfg(test)]
mod test;

pub use src::*;
