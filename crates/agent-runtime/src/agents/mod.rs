//! Agents built by the runtime

pub mod tool;

pub use tool::ToolAgent;
