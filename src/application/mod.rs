//! Application layer — ports and services.
//!
//! Imports only from `crate::domain`; all I/O is routed through the port
//! traits in [`ports`].

pub mod ports;
pub mod services;
