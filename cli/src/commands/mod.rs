//! Command implementations

pub mod debug;
pub mod deploy;
pub mod setup;

mod workflow;
