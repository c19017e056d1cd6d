//! Orchestration for one team run: design, implement, review, execute.
//!
//! Stages run strictly in order and each one finishes before the next starts.
//! A generation failure aborts the run; an execution fault does not, it is
//! part of the report.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument};

use crate::agents::architect::SoftwareArchitect;
use crate::agents::coder::Coder;
use crate::agents::manager::ProductManager;
use crate::agents::reviewer::CodeReviewer;
use crate::core::bundle::SourceBundle;
use crate::core::types::{ExecutionOutcome, ModuleSpec};
use crate::io::generator::Generator;

pub const DEFAULT_PRODUCT_DESCRIPTION: &str =
    "A calculator that can perform basic arithmetic operations.";

/// Knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Ask the reviewer for a review and documentation of every module.
    pub review: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { review: true }
    }
}

/// Progress notifications, emitted as soon as each piece is available.
#[derive(Debug, Clone, Copy)]
pub enum PipelineEvent<'a> {
    Designed {
        modules: &'a [ModuleSpec],
    },
    Implemented {
        module: &'a ModuleSpec,
        source: &'a str,
    },
    Reviewed {
        module: &'a ModuleSpec,
        review: &'a str,
        documentation: &'a str,
    },
    Executed {
        outcome: &'a ExecutionOutcome,
    },
}

/// Everything produced for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReport {
    pub module: ModuleSpec,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub product_description: String,
    pub modules: Vec<ModuleReport>,
    pub outcome: ExecutionOutcome,
    /// Manager's verdict over the whole session, including earlier runs.
    pub satisfactory: bool,
}

/// Run the full team sequence for `product_description`.
#[instrument(skip_all)]
pub fn run_pipeline<G, F>(
    generator: &G,
    manager: &mut ProductManager,
    product_description: &str,
    options: &PipelineOptions,
    mut on_event: F,
) -> Result<PipelineReport>
where
    G: Generator,
    F: FnMut(PipelineEvent<'_>),
{
    let architect = SoftwareArchitect::new(generator);
    let coder = Coder::new(generator);
    let reviewer = CodeReviewer::new(generator);

    let modules = architect
        .design_modules(product_description)
        .context("design modules")?;
    info!(count = modules.len(), "modules designed");
    on_event(PipelineEvent::Designed { modules: &modules });

    let mut bundle = SourceBundle::new();
    let mut reports = Vec::with_capacity(modules.len());
    for module in &modules {
        let source = coder
            .implement(module)
            .with_context(|| format!("implement module {}", module.name))?;
        bundle.push(&source);
        on_event(PipelineEvent::Implemented {
            module,
            source: &source,
        });
        reports.push(ModuleReport {
            module: module.clone(),
            source,
            review: None,
            documentation: None,
        });
    }

    if options.review {
        for report in &mut reports {
            let review = reviewer
                .review_code(&report.source)
                .with_context(|| format!("review module {}", report.module.name))?;
            let documentation = reviewer
                .document_code(&report.source)
                .with_context(|| format!("document module {}", report.module.name))?;
            on_event(PipelineEvent::Reviewed {
                module: &report.module,
                review: &review,
                documentation: &documentation,
            });
            report.review = Some(review);
            report.documentation = Some(documentation);
        }
    }

    info!(modules = bundle.module_count(), "running assembled product");
    let outcome = manager
        .run_and_review(&bundle.into_string())
        .context("run assembled product")?;
    on_event(PipelineEvent::Executed { outcome: &outcome });

    Ok(PipelineReport {
        product_description: product_description.to_string(),
        modules: reports,
        outcome,
        satisfactory: manager.is_satisfactory(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::SandboxConfig;
    use crate::io::generator::GenerationError;
    use crate::io::sandbox::Sandbox;
    use crate::test_support::ScriptedGenerator;

    fn manager() -> ProductManager {
        ProductManager::new(Sandbox::new(SandboxConfig::default()))
    }

    #[test]
    fn coder_failure_aborts_before_execution() {
        // Architect reply only; the coder finds the script exhausted.
        let generator = ScriptedGenerator::new(["Adder: adds"]);
        let mut manager = manager();
        let mut events = 0;

        let err = run_pipeline(
            &generator,
            &mut manager,
            "calc",
            &PipelineOptions::default(),
            |_| events += 1,
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("implement module Adder"));
        assert!(
            err.chain()
                .any(|cause| cause.downcast_ref::<GenerationError>().is_some())
        );
        assert_eq!(events, 1);
        assert!(manager.is_satisfactory());
    }

    #[test]
    fn review_failure_aborts_after_implementation() {
        let generator = ScriptedGenerator::new(["Adder: adds", "def add(a, b): return a + b"]);
        let mut manager = manager();
        let mut implemented = Vec::new();

        let err = run_pipeline(
            &generator,
            &mut manager,
            "calc",
            &PipelineOptions::default(),
            |event| {
                if let PipelineEvent::Implemented { module, .. } = event {
                    implemented.push(module.name.clone());
                }
            },
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("review module Adder"));
        assert_eq!(implemented, ["Adder"]);
    }
}
