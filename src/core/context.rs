//! Run context - the shell, the ambient command environment and the reporter
//! shared by every step of a run

use crate::execution::{CommandLine, ExecutionResult, Reporter, Shell, TraceEvent};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Execution context for a run
///
/// `env` holds the variables exported to every shelled-out command. Steps
/// never change it directly; they take a [`ScopedEnv`] through
/// [`RunContext::scoped_env`], which puts the previous value back when dropped.
pub struct RunContext {
    shell: Box<dyn Shell>,
    env: BTreeMap<String, String>,
    reporter: Reporter,
}

impl RunContext {
    pub fn new(shell: Box<dyn Shell>, reporter: Reporter) -> Self {
        Self {
            shell,
            env: BTreeMap::new(),
            reporter,
        }
    }

    /// Set an ambient variable for the rest of the run
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// Get an ambient variable
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Override one variable until the returned guard is dropped
    pub fn scoped_env(&mut self, key: &str, value: impl Into<String>) -> ScopedEnv<'_> {
        let previous = self.env.insert(key.to_string(), value.into());
        ScopedEnv {
            context: self,
            key: key.to_string(),
            previous,
        }
    }

    /// Run a command with the current environment
    ///
    /// The `running:` trace goes out before the command is spawned.
    pub async fn run(&self, command: CommandLine) -> ExecutionResult {
        let command = command.with_env(&self.env);
        self.reporter.emit(TraceEvent::CommandStarted {
            command: command.to_string(),
        });

        let result = self.shell.execute(&command).await;

        self.reporter.emit(TraceEvent::CommandFinished {
            exit_status: result.exit_status,
        });
        result
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("env", &self.env)
            .field("reporter", &self.reporter)
            .finish()
    }
}

/// A temporary environment override; restores the previous value on drop
pub struct ScopedEnv<'a> {
    context: &'a mut RunContext,
    key: String,
    previous: Option<String>,
}

impl Deref for ScopedEnv<'_> {
    type Target = RunContext;

    fn deref(&self) -> &RunContext {
        self.context
    }
}

impl DerefMut for ScopedEnv<'_> {
    fn deref_mut(&mut self) -> &mut RunContext {
        self.context
    }
}

impl Drop for ScopedEnv<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => {
                self.context.env.insert(self.key.clone(), value);
            }
            None => {
                self.context.env.remove(&self.key);
            }
        }
    }
}
