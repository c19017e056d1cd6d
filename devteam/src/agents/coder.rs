//! Coder agent: implements one module.

use anyhow::Result;
use tracing::{info, instrument};

use crate::core::types::ModuleSpec;
use crate::io::generator::Generator;
use crate::io::prompt::render_coder;

use super::complete;

#[derive(Debug, Clone)]
pub struct Coder<G> {
    generator: G,
}

impl<G: Generator> Coder<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Return the model's implementation of the module, verbatim.
    #[instrument(skip_all, fields(module = name))]
    pub fn implement_module(&self, name: &str, description: &str) -> Result<String> {
        info!(description, "received module");
        let prompt = render_coder(name, description)?;
        let code = complete(&self.generator, "coder", &prompt)?;
        info!(code = %code, "generated code");
        Ok(code)
    }

    pub fn implement(&self, module: &ModuleSpec) -> Result<String> {
        self.implement_module(&module.name, &module.description)
    }
}
