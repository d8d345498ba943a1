//! Step domain model

use crate::core::{context::RunContext, error::FatalStepError};
use async_trait::async_trait;

/// Work a step performs when the runner reaches it
///
/// Everything the action needs is captured when the step is built; the
/// context only supplies the shell, the ambient environment and the reporter.
#[async_trait]
pub trait StepAction: Send + Sync {
    async fn perform(&self, ctx: &mut RunContext) -> Result<(), FatalStepError>;
}

/// A single named step in a pipeline
#[derive(Debug, Clone)]
pub struct Step<A> {
    /// Unique step name, used by `--list` and `--skip`
    pub name: String,

    /// The bound action
    pub action: A,
}

impl<A> Step<A> {
    pub fn new(name: impl Into<String>, action: A) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

impl<A: StepAction> Step<A> {
    /// Invoke the bound action
    pub async fn perform(&self, ctx: &mut RunContext) -> Result<(), FatalStepError> {
        self.action.perform(ctx).await
    }
}
