//! Reviewer agent: critiques and documents generated code.

use anyhow::Result;
use tracing::{info, instrument};

use crate::io::generator::Generator;
use crate::io::prompt::{render_documenter, render_reviewer};

use super::complete;

#[derive(Debug, Clone)]
pub struct CodeReviewer<G> {
    generator: G,
}

impl<G: Generator> CodeReviewer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    #[instrument(skip_all, fields(code_bytes = code.len()))]
    pub fn review_code(&self, code: &str) -> Result<String> {
        let prompt = render_reviewer(code)?;
        let review = complete(&self.generator, "reviewer", &prompt)?;
        info!(review = %review, "review response");
        Ok(review)
    }

    #[instrument(skip_all, fields(code_bytes = code.len()))]
    pub fn document_code(&self, code: &str) -> Result<String> {
        let prompt = render_documenter(code)?;
        let documentation = complete(&self.generator, "documenter", &prompt)?;
        info!(documentation = %documentation, "documentation response");
        Ok(documentation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;

    #[test]
    fn review_and_documentation_use_separate_prompts() {
        let generator = ScriptedGenerator::new(["Looks fine.", "Adds numbers."]);
        let reviewer = CodeReviewer::new(&generator);
        let code = "def add(a, b):\n    return a + b";

        assert_eq!(reviewer.review_code(code).expect("review"), "Looks fine.");
        assert_eq!(
            reviewer.document_code(code).expect("document"),
            "Adds numbers."
        );

        let prompts = generator.prompts();
        assert!(prompts[0].starts_with("As a code reviewer"));
        assert!(prompts[1].starts_with("As a documenter"));
        assert!(prompts.iter().all(|p| p.contains(code)));
    }
}
