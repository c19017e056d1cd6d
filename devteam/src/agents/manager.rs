//! Product manager agent: runs the assembled product and keeps score.

use anyhow::Result;
use tracing::{error, info, instrument};

use crate::core::review::ReviewHistory;
use crate::core::types::ExecutionOutcome;
use crate::io::sandbox::Sandbox;

/// Runs generated source through the sandbox and records every fault.
///
/// The review history lives as long as the manager, so satisfaction covers
/// every run of the session, not only the latest one.
#[derive(Debug, Clone)]
pub struct ProductManager {
    sandbox: Sandbox,
    history: ReviewHistory,
}

impl ProductManager {
    pub fn new(sandbox: Sandbox) -> Self {
        Self {
            sandbox,
            history: ReviewHistory::new(),
        }
    }

    /// Execute `source` and review the outcome.
    ///
    /// Execution faults come back as a failed outcome and are recorded in the
    /// history. `Err` only signals that the sandbox itself could not run.
    #[instrument(skip_all, fields(source_bytes = source.len()))]
    pub fn run_and_review(&mut self, source: &str) -> Result<ExecutionOutcome> {
        info!(source = %source, "received code for execution");
        let outcome = self.sandbox.execute(source)?;

        match &outcome {
            ExecutionOutcome::Succeeded {
                captured_output,
                result_value,
            } => {
                info!(output = %captured_output, "execution output");
                match result_value {
                    Some(value) => info!(result = %value, "result of execution"),
                    None => info!("no `result` binding found in executed code"),
                }
            }
            ExecutionOutcome::Failed { error_message } => {
                error!(error = %error_message, "execution failed");
                self.history.record_error(error_message.clone());
            }
        }
        Ok(outcome)
    }

    pub fn is_satisfactory(&self) -> bool {
        self.history.is_satisfactory()
    }

    pub fn history(&self) -> &ReviewHistory {
        &self.history
    }
}
