//! Pipeline execution: the runner, the precondition gate, the trace reporter
//! and the shell commands go through

pub mod engine;
pub mod gate;
pub mod reporter;
pub mod shell;

pub use engine::ExecutionEngine;
pub use gate::PreconditionGate;
pub use reporter::{EventHandler, Reporter, TraceEvent};
pub use shell::{shell_quote, CommandLine, ExecutionResult, Shell, SystemShell};
