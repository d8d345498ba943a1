//! Scripted queries against the local database instance

use crate::core::{parse, FatalStepError, RunContext};
use crate::execution::{CommandLine, TraceEvent};

/// Render the command that feeds `body` to the script runner as sysdba
///
/// Uses `$ORACLE_HOME`, so the caller's environment picks the installation.
pub fn sql_command(body: &str, run_as: &str) -> CommandLine {
    CommandLine::new(format!(
        "\"$ORACLE_HOME/bin/sqlplus\" -S -L / as sysdba <<'REHOST_EOF'\n\
         WHENEVER SQLERROR EXIT SQL.SQLCODE\n\
         SET HEADING OFF FEEDBACK OFF PAGESIZE 0 VERIFY OFF\n\
         {}\n\
         EXIT\n\
         REHOST_EOF",
        body.trim_end()
    ))
    .run_as(run_as)
}

/// Run a script and return its output
///
/// A non-zero exit or any error-code line fails the script, unless every
/// error line carries one of the `accept` codes.
pub async fn run_sql(
    ctx: &RunContext,
    body: &str,
    run_as: &str,
    accept: &[String],
) -> Result<String, FatalStepError> {
    let result = ctx.run(sql_command(body, run_as)).await;
    let errors = parse::tool_errors(&result.output);

    if result.success() && errors.is_empty() {
        return Ok(result.output);
    }

    if !errors.is_empty()
        && errors
            .iter()
            .all(|line| accept.iter().any(|code| line.contains(code.as_str())))
    {
        ctx.reporter().emit(TraceEvent::AlreadySatisfied {
            detail: errors.join("; "),
        });
        return Ok(result.output);
    }

    Err(FatalStepError::new(format!(
        "script failed with exit status {}",
        result.exit_status
    ))
    .with_output(&result.output))
}
