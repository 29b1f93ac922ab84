//! Capability framework for agent pipelines
//!
//! This crate provides the pieces agents use to reach the outside world:
//! a [`Capability`] trait, typed [`ParameterSchema`]s that every call is
//! validated against, and a [`CapabilityRegistry`] that dispatches calls with
//! a deadline and turns every failure into an error document.

pub mod capability;
pub mod error;
pub mod registry;
pub mod schema;

pub use capability::{Capability, CapabilitySpec, FnCapability};
pub use error::{CapabilityError, is_error_document};
pub use registry::{CapabilityRegistry, DEFAULT_TIMEOUT, Dispatched};
pub use schema::{ParamSpec, ParamType, ParameterSchema};
