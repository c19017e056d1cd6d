//! Role agents of the team.
//!
//! Each agent renders its prompt template, forwards it to a
//! [`Generator`](crate::io::generator::Generator) and returns text. The manager
//! is the exception: it never talks to the model, it runs the product.

use anyhow::{Context, Result};

use crate::io::generator::Generator;

pub mod architect;
pub mod coder;
pub mod manager;
pub mod reviewer;

/// Send `prompt` to `generator`, labelling a failure with the role that asked.
pub(crate) fn complete<G: Generator>(generator: &G, role: &str, prompt: &str) -> Result<String> {
    generator
        .generate(prompt)
        .with_context(|| format!("{role} completion"))
}
