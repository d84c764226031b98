//! Restricted interpreters for untrusted, model-generated text.
//!
//! Two independent components, both pure functions over text:
//!
//! - [`calc`] parses and evaluates a closed arithmetic grammar and renders
//!   the numeric result.
//! - [`script`] runs a small statement language against an allowlisted
//!   environment and returns captured output.
//!
//! Neither component touches the filesystem, the network, or any process
//! state. Every name, operator, and builtin that submitted text can reach is
//! a member of a fixed table compiled into this crate; anything outside those
//! tables is rejected with an [`EvalError`], never silently ignored. All
//! mutable state (trees, local bindings, output buffers) is allocated inside
//! a single call and dropped when it returns, so invocations are reentrant
//! and safe to run concurrently.

pub mod calc;
pub mod script;

mod error;

pub use error::EvalError;
