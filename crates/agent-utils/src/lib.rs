//! Shared utilities for the agent workspace
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup, environment-backed configuration and opaque
//! credential handling.

pub mod config;
pub mod logging;

pub use config::{Secret, env_or, env_secret, env_var};
pub use logging::{init_tracing, init_tracing_json};
