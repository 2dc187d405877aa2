//! Dependency collection, module resolution and entry-point ordering.

pub mod src;

#[cfg(test)]
mod test;

pub use src::*;
