//! The actions a runbook step can be bound to

use crate::core::parse::{self, ServiceState, SpfileLocation};
use crate::core::{FatalStepError, PollSettings, RunContext, StepAction};
use crate::execution::{CommandLine, TraceEvent};
use crate::system::{self, Accepted, Service, Substitution, Transition};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// A step's work with all of its arguments captured
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Stop a service; already stopped is fine
    Stop(Service),

    /// Start a service; already running is fine
    Start(Service),

    /// Poll a service until it reaches a state
    WaitFor {
        service: Service,
        state: ServiceState,
        poll: PollSettings,
    },

    /// Run a command; a non-zero result `accept` covers counts as already done
    Command {
        command: CommandLine,
        accept: Accepted,
    },

    /// Apply substitutions to a file in place
    EditFile {
        path: PathBuf,
        substitutions: Vec<Substitution>,
    },

    /// Create a directory owned by `owner:group`
    MakeDir {
        path: PathBuf,
        owner: String,
        group: String,
    },

    /// Run a SQL script as sysdba
    Sql {
        body: String,
        run_as: String,
        accept: Vec<String>,
    },

    /// Write the database's parameters to a text file, from the stored
    /// parameter file or `fallback_spfile` when none is stored
    ExportPfile {
        database: Service,
        run_as: String,
        group: String,
        pfile: PathBuf,
        fallback_spfile: PathBuf,
    },

    /// Require the open database to report `expected` as its name
    VerifyDatabaseName { run_as: String, expected: String },

    /// Run `action` with one environment variable overridden
    WithEnv {
        key: String,
        value: String,
        action: Box<Action>,
    },
}

impl Action {
    /// Wrap this action in an environment override
    pub fn with_env(self, key: &str, value: impl Into<String>) -> Self {
        Action::WithEnv {
            key: key.to_string(),
            value: value.into(),
            action: Box::new(self),
        }
    }
}

#[async_trait]
impl StepAction for Action {
    async fn perform(&self, ctx: &mut RunContext) -> Result<(), FatalStepError> {
        match self {
            Action::Stop(service) => {
                service.stop(ctx).await?;
                Ok(())
            }
            Action::Start(service) => {
                service.start(ctx).await?;
                Ok(())
            }
            Action::WaitFor {
                service,
                state,
                poll,
            } => service.wait_for(ctx, *state, poll).await,
            Action::Command { command, accept } => run_command(ctx, command, accept).await,
            Action::EditFile {
                path,
                substitutions,
            } => {
                system::edit_file(ctx, path, substitutions).await?;
                Ok(())
            }
            Action::MakeDir { path, owner, group } => {
                system::make_owned_dir(ctx, path, owner, group).await
            }
            Action::Sql {
                body,
                run_as,
                accept,
            } => {
                system::run_sql(ctx, body, run_as, accept).await?;
                Ok(())
            }
            Action::ExportPfile {
                database,
                run_as,
                group,
                pfile,
                fallback_spfile,
            } => export_pfile(ctx, database, run_as, group, pfile, fallback_spfile).await,
            Action::VerifyDatabaseName { run_as, expected } => {
                let output =
                    system::run_sql(ctx, "SELECT name FROM v$database;", run_as, &[]).await?;
                let name = parse::database_name(&output)?;
                if !name.eq_ignore_ascii_case(expected) {
                    return Err(FatalStepError::new(format!(
                        "database reports its name as {}, expected {}",
                        name, expected
                    ))
                    .with_output(&output));
                }
                info!("Database name is {}", name);
                Ok(())
            }
            Action::WithEnv { key, value, action } => {
                let mut scoped = ctx.scoped_env(key, value.clone());
                action.perform(&mut scoped).await
            }
        }
    }
}

async fn run_command(
    ctx: &RunContext,
    command: &CommandLine,
    accept: &Accepted,
) -> Result<(), FatalStepError> {
    let result = ctx.run(command.clone()).await;

    let failed = |e: FatalStepError| FatalStepError {
        message: format!("'{}' failed: {}", command.line(), e.message),
        diagnostics: e.diagnostics,
    };

    match system::classify(&result, accept).map_err(failed)? {
        Transition::AlreadyInState => {
            ctx.reporter().emit(TraceEvent::AlreadySatisfied {
                detail: format!("'{}' had nothing to do", command.line()),
            });
        }
        Transition::Changed => {
            if !parse::tool_errors(&result.output).is_empty() {
                return Err(FatalStepError::new(format!(
                    "'{}' reported errors",
                    command.line()
                ))
                .with_output(&result.output));
            }
        }
    }
    Ok(())
}

async fn export_pfile(
    ctx: &RunContext,
    database: &Service,
    run_as: &str,
    group: &str,
    pfile: &Path,
    fallback_spfile: &Path,
) -> Result<(), FatalStepError> {
    let source = match database.stored_spfile(ctx).await? {
        SpfileLocation::Stored(path) => path,
        SpfileLocation::NotStored => {
            info!(
                "No stored parameter file for {}, using {}",
                database.label(),
                fallback_spfile.display()
            );
            fallback_spfile.to_path_buf()
        }
    };

    if let Some(dir) = pfile.parent() {
        system::make_owned_dir(ctx, dir, run_as, group).await?;
    }

    let body = format!(
        "CREATE PFILE='{}' FROM SPFILE='{}';",
        pfile.display(),
        source.display()
    );
    system::run_sql(ctx, &body, run_as, &[]).await?;
    Ok(())
}
