//! Error types for runbook execution

use thiserror::Error;

/// The single failure kind a step can raise.
///
/// Carries a human-readable message plus the raw output captured from the
/// external command that prompted it. Raising one aborts the whole run.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FatalStepError {
    /// What went wrong
    pub message: String,

    /// Raw lines captured from the external tool, if any
    pub diagnostics: Vec<String>,
}

impl FatalStepError {
    /// Create an error with no captured output
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Attach captured output, one diagnostic line per output line
    pub fn with_output(mut self, output: &str) -> Self {
        self.diagnostics
            .extend(output.lines().map(|line| line.to_string()));
        self
    }
}

/// Errors that end a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: FatalStepError,
    },

    #[error("precondition failed: {0}")]
    Precondition(FatalStepError),

    #[error("no step named '{0}' in this runbook (see --list)")]
    UnknownStep(String),

    #[error("duplicate step name '{0}'")]
    DuplicateStep(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

impl RunError {
    /// Captured diagnostics behind this error, if it carries any
    pub fn diagnostics(&self) -> &[String] {
        match self {
            RunError::Step { source, .. } => &source.diagnostics,
            RunError::Precondition(source) => &source.diagnostics,
            _ => &[],
        }
    }

    /// Name of the step that failed, for resume hints
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            RunError::Step { step, .. } => Some(step),
            _ => None,
        }
    }
}
