//! Compilation tasks and the executors that run them in dependency order.

pub mod src;

#[cfg(test)]
mod test;

pub use src::*;
