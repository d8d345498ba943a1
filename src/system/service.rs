//! Process control for the managed services

use crate::core::parse::{self, ServiceState, SpfileLocation};
use crate::core::{FatalStepError, PollSettings, RunContext};
use crate::execution::{CommandLine, ExecutionResult, TraceEvent};
use std::time::Duration;
use tracing::{debug, info};

/// A service the runbook stops, starts and waits on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Service {
    /// A database resource registered with the high availability stack
    Database {
        id: String,
        home: String,
        owner: String,
    },
    /// The high availability stack itself
    HighAvailability { home: String },
}

/// How a start or stop request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    AlreadyInState,
}

impl Service {
    /// Short label for traces
    pub fn label(&self) -> String {
        match self {
            Service::Database { id, .. } => format!("database {}", id),
            Service::HighAvailability { .. } => "high availability services".to_string(),
        }
    }

    fn command(&self, verb: &str) -> CommandLine {
        match self {
            Service::Database { id, home, owner } => {
                CommandLine::new(format!("{}/bin/srvctl {} database -d {}", home, verb, id))
                    .run_as(owner.clone())
            }
            Service::HighAvailability { home } => {
                CommandLine::new(format!("{}/bin/crsctl {} has", home, verb))
            }
        }
    }

    /// Results a request ends with when the service is already where we want it
    fn already(&self, target: ServiceState) -> Accepted {
        match (self, target) {
            // PRCC-1016: already stopped
            (Service::Database { .. }, ServiceState::Stopped) => {
                Accepted::new(&[1, 2], &["PRCC-1016"])
            }
            // PRCC-1014: already running
            (Service::Database { .. }, ServiceState::Running) => {
                Accepted::new(&[1, 2], &["PRCC-1014"])
            }
            // CRS-4639: could not contact the stack
            (Service::HighAvailability { .. }, ServiceState::Stopped) => {
                Accepted::new(&[1], &["CRS-4639"])
            }
            // CRS-4640: already running
            (Service::HighAvailability { .. }, ServiceState::Running) => {
                Accepted::new(&[1], &["CRS-4640"])
            }
        }
    }

    pub async fn stop(&self, ctx: &RunContext) -> Result<Transition, FatalStepError> {
        self.transition(ctx, "stop", ServiceState::Stopped).await
    }

    pub async fn start(&self, ctx: &RunContext) -> Result<Transition, FatalStepError> {
        self.transition(ctx, "start", ServiceState::Running).await
    }

    async fn transition(
        &self,
        ctx: &RunContext,
        verb: &str,
        target: ServiceState,
    ) -> Result<Transition, FatalStepError> {
        let result = ctx.run(self.command(verb)).await;
        let transition = classify(&result, &self.already(target)).map_err(|e| {
            FatalStepError {
                message: format!("failed to {} {}: {}", verb, self.label(), e.message),
                diagnostics: e.diagnostics,
            }
        })?;

        if transition == Transition::AlreadyInState {
            ctx.reporter().emit(TraceEvent::AlreadySatisfied {
                detail: format!("{} already {}", self.label(), target),
            });
        }
        Ok(transition)
    }

    /// Current state, read from the status command's output
    pub async fn status(&self, ctx: &RunContext) -> Result<ServiceState, FatalStepError> {
        match self {
            Service::Database { .. } => {
                let result = ctx.run(self.command("status")).await;
                parse::database_status(&result.output)
            }
            Service::HighAvailability { .. } => {
                let result = ctx.run(self.command("check")).await;
                parse::has_status(&result.output)
            }
        }
    }

    /// Server parameter file recorded in the stack's stored configuration
    pub async fn stored_spfile(&self, ctx: &RunContext) -> Result<SpfileLocation, FatalStepError> {
        if let Service::HighAvailability { .. } = self {
            return Err(FatalStepError::new(format!(
                "{} has no parameter file",
                self.label()
            )));
        }

        let result = ctx.run(self.command("config")).await;
        if !result.success() {
            return Err(FatalStepError::new(format!(
                "cannot read the stored configuration of {}",
                self.label()
            ))
            .with_output(&result.output));
        }
        parse::spfile_location(&result.output)
    }

    /// Poll until the service reaches `target` or the attempts run out
    pub async fn wait_for(
        &self,
        ctx: &RunContext,
        target: ServiceState,
        poll: &PollSettings,
    ) -> Result<(), FatalStepError> {
        let interval = Duration::from_secs(poll.interval_secs);
        let mut last = None;

        for attempt in 1..=poll.attempts {
            ctx.reporter().emit(TraceEvent::Polling {
                subject: format!("{} to be {}", self.label(), target),
                attempt,
                attempts: poll.attempts,
            });

            let state = self.status(ctx).await?;
            if state == target {
                info!("{} is {}", self.label(), target);
                return Ok(());
            }
            debug!("{} is {} (attempt {}/{})", self.label(), state, attempt, poll.attempts);
            last = Some(state);

            if attempt < poll.attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(FatalStepError::new(format!(
            "{} not {} after {} checks (last seen {})",
            self.label(),
            target,
            poll.attempts,
            last.map(|s| s.to_string()).unwrap_or_else(|| "nothing".to_string())
        )))
    }
}

/// Non-zero results a step declares as "already done"
///
/// A result is accepted when its exit status is one of `statuses` and, if any
/// markers are given, its output mentions one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accepted {
    pub statuses: Vec<i32>,
    pub markers: Vec<String>,
}

impl Accepted {
    pub fn new(statuses: &[i32], markers: &[&str]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            markers: markers.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Nothing but a zero exit counts
    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn covers(&self, result: &ExecutionResult) -> bool {
        if !self.statuses.contains(&result.exit_status) {
            return false;
        }
        let markers: Vec<&str> = self.markers.iter().map(String::as_str).collect();
        markers.is_empty() || result.mentions(&markers)
    }
}

/// Classify a command result: zero is a change, a result `accepted` covers
/// is "already done", anything else is fatal
pub fn classify(
    result: &ExecutionResult,
    accepted: &Accepted,
) -> Result<Transition, FatalStepError> {
    if result.success() {
        return Ok(Transition::Changed);
    }
    if accepted.covers(result) {
        return Ok(Transition::AlreadyInState);
    }
    Err(
        FatalStepError::new(format!("exit status {}", result.exit_status))
            .with_output(&result.output),
    )
}
