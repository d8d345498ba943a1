//! rehost - a resumable runbook that moves an Oracle Restart stack to a new
//! host name and renames its database

pub mod cli;
pub mod core;
pub mod execution;
pub mod runbook;
pub mod system;

// Re-export commonly used types
pub use crate::core::{FatalStepError, Pipeline, RunContext, RunError, RunSummary, Settings, Step, StepAction, Targets};
pub use crate::execution::{ExecutionEngine, PreconditionGate, Reporter, Shell, SystemShell, TraceEvent};
pub use crate::runbook::Action;
