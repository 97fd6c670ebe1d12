//! Application services — use-case orchestration over the port traits.

pub mod demo;
pub mod http_verify;
pub mod provision;
