//! Infrastructure layer — production implementations of the port traits.

pub mod command_runner;
pub mod config;
pub mod docker;
pub mod network;

pub use command_runner::{DEFAULT_CLI_TIMEOUT, TokioCommandRunner};
pub use config::RuntimeConfig;
pub use docker::BollardRuntime;
pub use network::TokioNetworkProbe;
