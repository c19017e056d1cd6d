//! I/O helpers for the team: config, processes, model backends, prompts, sandbox.

pub mod config;
pub mod generator;
pub mod process;
pub mod prompt;
pub mod sandbox;
