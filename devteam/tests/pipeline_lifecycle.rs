//! End-to-end pipeline tests with a scripted model and the real sandbox.
//!
//! Each test queues the replies the architect, coder and reviewer would get,
//! then checks what reached the sandbox and how the manager judged it.

use devteam::agents::manager::ProductManager;
use devteam::core::types::ExecutionOutcome;
use devteam::io::config::SandboxConfig;
use devteam::io::sandbox::Sandbox;
use devteam::pipeline::{PipelineEvent, PipelineOptions, run_pipeline};
use devteam::test_support::{ScriptedGenerator, require_python};
use serde_json::json;

fn manager() -> ProductManager {
    ProductManager::new(Sandbox::new(SandboxConfig {
        timeout_secs: 10,
        ..SandboxConfig::default()
    }))
}

/// Full run: two modules are designed, implemented, reviewed and documented,
/// and the concatenated program runs with its `result` reported back.
#[test]
fn calculator_run_executes_bundled_modules() {
    require_python();
    let generator = ScriptedGenerator::new([
        // architect
        "Modules:\nOperations: arithmetic helpers\nMain: prints a sample calculation\n",
        // coder, one reply per module
        "def add(a, b):\n    return a + b",
        "print(add(2, 3))\nresult = add(20, 22)",
        // reviewer: review + documentation per module
        "ok",
        "adds numbers",
        "ok",
        "prints a sum",
    ]);
    let mut manager = manager();
    let mut events = Vec::new();

    let report = run_pipeline(
        &generator,
        &mut manager,
        "A calculator that can perform basic arithmetic operations.",
        &PipelineOptions::default(),
        |event| {
            events.push(match event {
                PipelineEvent::Designed { .. } => "designed",
                PipelineEvent::Implemented { .. } => "implemented",
                PipelineEvent::Reviewed { .. } => "reviewed",
                PipelineEvent::Executed { .. } => "executed",
            });
        },
    )
    .expect("pipeline");

    assert_eq!(
        events,
        [
            "designed",
            "implemented",
            "implemented",
            "reviewed",
            "reviewed",
            "executed"
        ]
    );
    assert_eq!(generator.remaining(), 0);
    assert_eq!(report.modules.len(), 2);
    assert_eq!(report.modules[0].module.name, "Operations");
    assert_eq!(report.modules[1].review.as_deref(), Some("ok"));
    assert_eq!(
        report.modules[1].documentation.as_deref(),
        Some("prints a sum")
    );
    assert_eq!(
        report.outcome,
        ExecutionOutcome::success("5\n", Some(json!(42)))
    );
    assert!(report.satisfactory);

    // Reviewer prompts carry the generated code, not just the module name.
    let prompts = generator.prompts();
    assert!(prompts[3].contains("def add(a, b):"));
}

/// A module that raises fails the run without aborting it, and the manager
/// stays unsatisfied for the rest of the session.
#[test]
fn failing_product_is_reported_and_remembered() {
    require_python();
    let mut manager = manager();
    let no_review = PipelineOptions { review: false };

    let broken = ScriptedGenerator::new(["Divider: divides", "result = 1 / 0"]);
    let first = run_pipeline(&broken, &mut manager, "divider", &no_review, |_| {})
        .expect("pipeline");
    assert!(!first.outcome.succeeded());
    assert!(
        first
            .outcome
            .error_message()
            .expect("message")
            .contains("division by zero")
    );
    assert!(!first.satisfactory);
    assert!(first.modules[0].review.is_none());

    let fixed = ScriptedGenerator::new(["Divider: divides", "result = 4 / 2"]);
    let second = run_pipeline(&fixed, &mut manager, "divider", &no_review, |_| {})
        .expect("pipeline");
    assert!(second.outcome.succeeded());
    assert_eq!(second.outcome.result_value(), Some(&json!(2.0)));
    assert!(!second.satisfactory);
    assert_eq!(manager.history().errors().len(), 1);
}

/// An architect reply with no module lines still runs (an empty program).
#[test]
fn empty_design_runs_empty_program() {
    require_python();
    let generator = ScriptedGenerator::new(["I am not sure what to build."]);
    let mut manager = manager();

    let report = run_pipeline(
        &generator,
        &mut manager,
        "???",
        &PipelineOptions::default(),
        |_| {},
    )
    .expect("pipeline");

    assert!(report.modules.is_empty());
    assert_eq!(report.outcome, ExecutionOutcome::success("", None));
    assert_eq!(generator.prompts().len(), 1);
}
