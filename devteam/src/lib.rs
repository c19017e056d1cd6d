//! A small simulated software team driven by a language model.
//!
//! An architect splits a product description into modules, a coder implements
//! each one, a reviewer critiques and documents the code, and a product manager
//! runs the assembled program in a sandbox and keeps a review history.
//!
//! - **[`core`]**: Pure, deterministic logic (module parsing, source bundles,
//!   outcomes, review history). No I/O.
//! - **[`io`]**: Side effects (config, child processes, model backends, prompt
//!   rendering, the execution sandbox).
//! - **[`agents`]**: The four roles.
//!
//! [`pipeline`] wires the roles together for the `devteam run` command.

pub mod agents;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
