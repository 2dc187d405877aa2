//! Entry-points, their configuration, build markers and the entry-point manifest.

pub mod src;

#[cfg(test)]
mod test;

pub use src::*;
