//! Prompt templates for the team roles.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};

const ARCHITECT_TEMPLATE: &str = include_str!("prompts/architect.md");
const CODER_TEMPLATE: &str = include_str!("prompts/coder.md");
const REVIEWER_TEMPLATE: &str = include_str!("prompts/reviewer.md");
const DOCUMENTER_TEMPLATE: &str = include_str!("prompts/documenter.md");

static ENGINE: LazyLock<PromptEngine> = LazyLock::new(PromptEngine::new);

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("architect", ARCHITECT_TEMPLATE)
            .expect("architect template should be valid");
        env.add_template("coder", CODER_TEMPLATE)
            .expect("coder template should be valid");
        env.add_template("reviewer", REVIEWER_TEMPLATE)
            .expect("reviewer template should be valid");
        env.add_template("documenter", DOCUMENTER_TEMPLATE)
            .expect("documenter template should be valid");
        Self { env }
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        template
            .render(ctx)
            .with_context(|| format!("render {name} prompt"))
    }
}

/// Prompt asking the architect to split a product into modules.
pub fn render_architect(product_description: &str) -> Result<String> {
    ENGINE.render(
        "architect",
        context! { product_description => product_description.trim() },
    )
}

/// Prompt asking the coder to implement one module.
pub fn render_coder(module_name: &str, module_description: &str) -> Result<String> {
    ENGINE.render(
        "coder",
        context! { module_name => module_name, module_description => module_description },
    )
}

/// Prompt asking the reviewer to critique generated code.
pub fn render_reviewer(code: &str) -> Result<String> {
    ENGINE.render("reviewer", context! { code => code })
}

/// Prompt asking the documenter to describe generated code.
pub fn render_documenter(code: &str) -> Result<String> {
    ENGINE.render("documenter", context! { code => code })
}
