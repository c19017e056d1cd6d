//! Shared deterministic types for the team pipeline.
//!
//! These types define stable contracts between agents and the sandbox. They do
//! not depend on external state or I/O.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named unit of the product, as declared by the architect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    pub description: String,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Result of one sandboxed execution.
///
/// The variants carry exactly the fields that are meaningful for them: a
/// failed run has an error message and no captured output, a successful run
/// has captured output and never an error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Succeeded {
        /// Everything the program wrote to stdout.
        captured_output: String,
        /// Value bound to `result` by the executed code, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        result_value: Option<Value>,
    },
    Failed {
        /// Human-readable description of the fault.
        error_message: String,
    },
}

impl ExecutionOutcome {
    pub fn success(captured_output: impl Into<String>, result_value: Option<Value>) -> Self {
        Self::Succeeded {
            captured_output: captured_output.into(),
            result_value,
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self::Failed {
            error_message: error_message.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::Succeeded {
                captured_output, ..
            } => Some(captured_output),
            Self::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { error_message } => Some(error_message),
        }
    }

    pub fn result_value(&self) -> Option<&Value> {
        match self {
            Self::Succeeded { result_value, .. } => result_value.as_ref(),
            Self::Failed { .. } => None,
        }
    }
}
