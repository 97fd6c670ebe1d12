//! Command implementations

pub mod demo;
pub mod version;
