//! Domain layer — pure types, no I/O.

pub mod container;
pub mod error;

pub use container::{ContainerHandle, Endpoint, ImageRef, LifecycleState};
pub use error::{ProvisionError, RuntimeError};
