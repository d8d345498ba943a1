//! Precondition gate - cheap host checks made before any step runs

use crate::core::{parse, FatalStepError, RunContext, RunError, Settings, Targets};
use crate::execution::CommandLine;
use tracing::info;

/// Assertions evaluated once, in order, before a run
#[derive(Debug, Clone)]
pub struct PreconditionGate {
    /// `None` when the identity check is bypassed
    privileged_user: Option<String>,
    expected_host: String,
    accepted_runlevels: Vec<String>,
}

impl PreconditionGate {
    pub fn new(settings: &Settings, targets: &Targets, skip_identity_check: bool) -> Self {
        Self {
            privileged_user: (!skip_identity_check).then(|| settings.privileged_user.clone()),
            expected_host: targets.new_host.clone(),
            accepted_runlevels: settings.accepted_runlevels.clone(),
        }
    }

    /// Run every check; the first failure is returned
    pub async fn check(&self, ctx: &RunContext) -> Result<(), RunError> {
        self.check_identity(ctx).await?;
        self.check_hostname(ctx).await?;
        self.check_runlevel(ctx).await?;
        Ok(())
    }

    async fn check_identity(&self, ctx: &RunContext) -> Result<(), RunError> {
        let Some(expected) = &self.privileged_user else {
            info!("Identity check bypassed");
            return Ok(());
        };

        let user = probe(ctx, "id -un", |output| parse::single_token("identity", output)).await?;
        if &user != expected {
            return Err(RunError::Precondition(FatalStepError::new(format!(
                "must be run as {} (running as {}); use --no-root to bypass",
                expected, user
            ))));
        }
        info!("Running as {}", user);
        Ok(())
    }

    async fn check_hostname(&self, ctx: &RunContext) -> Result<(), RunError> {
        let reported = probe(ctx, "hostname", |output| parse::single_token("hostname", output)).await?;
        if !hostname_matches(&self.expected_host, &reported) {
            return Err(RunError::Precondition(FatalStepError::new(format!(
                "host reports its name as {}, expected {}; rename the host first",
                reported, self.expected_host
            ))));
        }
        info!("Hostname is {}", reported);
        Ok(())
    }

    async fn check_runlevel(&self, ctx: &RunContext) -> Result<(), RunError> {
        let level = probe(ctx, "runlevel", parse::runlevel).await?;
        if !self.accepted_runlevels.contains(&level) {
            return Err(RunError::Precondition(FatalStepError::new(format!(
                "host is at run level {}, expected one of {}",
                level,
                self.accepted_runlevels.join(", ")
            ))));
        }
        info!("Run level is {}", level);
        Ok(())
    }
}

async fn probe<T>(
    ctx: &RunContext,
    command: &str,
    interpret: impl Fn(&str) -> Result<T, FatalStepError>,
) -> Result<T, RunError> {
    let result = ctx.run(CommandLine::new(command)).await;
    if !result.success() {
        return Err(RunError::Precondition(
            FatalStepError::new(format!("'{}' exited with status {}", command, result.exit_status))
                .with_output(&result.output),
        ));
    }
    interpret(&result.output).map_err(RunError::Precondition)
}

/// Compare hostnames case-insensitively; a short expected name also matches
/// a fully qualified report
fn hostname_matches(expected: &str, reported: &str) -> bool {
    if expected.eq_ignore_ascii_case(reported) {
        return true;
    }
    !expected.contains('.')
        && reported
            .split('.')
            .next()
            .is_some_and(|short| short.eq_ignore_ascii_case(expected))
}
