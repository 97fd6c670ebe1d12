//! Wharf library — container runtime ports, the lifecycle demo flow, and
//! service fixtures for integration tests.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod output;
