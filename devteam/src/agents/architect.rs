//! Architect agent: splits a product description into modules.

use anyhow::Result;
use tracing::{info, instrument};

use crate::core::modules::parse_modules;
use crate::core::types::ModuleSpec;
use crate::io::generator::Generator;
use crate::io::prompt::render_architect;

use super::complete;

#[derive(Debug, Clone)]
pub struct SoftwareArchitect<G> {
    generator: G,
}

impl<G: Generator> SoftwareArchitect<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Ask the model for a module breakdown and parse it.
    ///
    /// A reply with no `Name: description` lines yields an empty list, not an error.
    #[instrument(skip_all)]
    pub fn design_modules(&self, product_description: &str) -> Result<Vec<ModuleSpec>> {
        info!(product_description, "received product description");
        let prompt = render_architect(product_description)?;
        let response = complete(&self.generator, "architect", &prompt)?;
        info!(response = %response, "architect response");

        let modules = parse_modules(&response);
        info!(count = modules.len(), modules = ?modules, "parsed modules");
        Ok(modules)
    }
}
