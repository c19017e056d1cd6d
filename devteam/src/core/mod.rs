//! Deterministic, pure logic shared by the agents and the sandbox.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod bundle;
pub mod modules;
pub mod review;
pub mod types;
