//! Shell executor - runs one external command and captures its combined output

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit status reported when the command could not be spawned at all
pub const SPAWN_FAILURE_STATUS: i32 = 127;

/// A fully-formed command line, optionally run as another user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    line: String,
    run_as: Option<String>,
    env: BTreeMap<String, String>,
}

impl CommandLine {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            run_as: None,
            env: BTreeMap::new(),
        }
    }

    /// Run the command under another identity
    pub fn run_as(mut self, user: impl Into<String>) -> Self {
        self.run_as = Some(user.into());
        self
    }

    /// Export these variables before the command line runs
    pub fn with_env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn user(&self) -> Option<&str> {
        self.run_as.as_deref()
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Render the script handed to `sh -c`
    ///
    /// Variables are exported inside the (possibly `su`-wrapped) script, so a
    /// login shell for another user still sees them.
    pub fn render(&self) -> String {
        let mut inner = String::new();
        for (key, value) in &self.env {
            inner.push_str(&format!("export {}={}; ", key, shell_quote(value)));
        }
        inner.push_str(&self.line);

        match &self.run_as {
            Some(user) => format!("su - {} -c {}", user, shell_quote(&inner)),
            None => inner,
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.run_as {
            Some(user) => write!(f, "[as {}] {}", user, self.line),
            None => write!(f, "{}", self.line),
        }
    }
}

/// Quote a value for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Outcome of one external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit status; 128 + N when killed by signal N
    pub exit_status: i32,

    /// Standard output and standard error, interleaved
    pub output: String,
}

impl ExecutionResult {
    pub fn new(exit_status: i32, output: impl Into<String>) -> Self {
        Self {
            exit_status,
            output: output.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// Check whether the output mentions any of the given markers
    pub fn mentions(&self, markers: &[&str]) -> bool {
        markers.iter().any(|marker| self.output.contains(marker))
    }
}

/// Something that can run a command line to completion
///
/// Implementations never fail: every problem is reported through the exit
/// status so the calling step decides what is fatal.
#[async_trait]
pub trait Shell: Send + Sync {
    async fn execute(&self, command: &CommandLine) -> ExecutionResult;
}

/// Runs commands through `/bin/sh` on the local host
#[derive(Debug, Clone)]
pub struct SystemShell {
    shell_path: String,
}

impl SystemShell {
    pub fn new() -> Self {
        Self {
            shell_path: "/bin/sh".to_string(),
        }
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Shell for SystemShell {
    async fn execute(&self, command: &CommandLine) -> ExecutionResult {
        let script = format!("exec 2>&1; {}", command.render());
        debug!("sh -c {}", script);

        let output = Command::new(&self.shell_path)
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to spawn {}: {}", self.shell_path, e);
                return ExecutionResult::new(
                    SPAWN_FAILURE_STATUS,
                    format!("failed to spawn {}: {}", self.shell_path, e),
                );
            }
        };

        let exit_status = match output.status.code() {
            Some(code) => code,
            None => signal_status(&output.status),
        };

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("exit status {} with {} bytes of output", exit_status, text.len());

        ExecutionResult::new(exit_status, text)
    }
}

#[cfg(unix)]
fn signal_status(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|sig| 128 + sig).unwrap_or(-1)
}

#[cfg(not(unix))]
fn signal_status(_status: &std::process::ExitStatus) -> i32 {
    -1
}
