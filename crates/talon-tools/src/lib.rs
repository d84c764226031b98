//! Tool layer of the talon agent toolkit.
//!
//! Each tool implements [`Tool`] and is invoked through the
//! [`ToolDispatcher`], which applies the wall-clock timeout and panic
//! isolation. The sandboxed computation tools (`calculator`, `script.run`)
//! delegate to the `talon-interp` crate; the file tools are confined to a
//! workspace root by [`sandbox::PathGuard`].

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod execution_context;
pub mod registry;
pub mod sandbox;
pub mod tools;

pub use config::ToolsConfig;
pub use dispatcher::ToolDispatcher;
pub use error::ToolError;
pub use execution_context::ExecutionContext;
pub use registry::{standard_registry, ToolRegistry};
pub use tools::{Tool, ToolResult};
