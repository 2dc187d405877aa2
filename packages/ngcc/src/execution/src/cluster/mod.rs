//! A coordinator handing tasks to a pool of worker threads over JSON messages.

pub mod api;
pub mod executor;
pub mod master;
pub mod worker;

pub use api::*;
pub use executor::*;
pub use master::*;
pub use worker::*;
