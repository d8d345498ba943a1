//! Directories with a specific owner

use crate::core::{FatalStepError, RunContext};
use crate::execution::{shell_quote, CommandLine};
use std::path::Path;

/// Create `path` and its parents, then hand it to `owner:group`
///
/// Goes through the shell so the command shows up in the trace; rerunning on
/// an existing directory only reapplies the ownership.
pub async fn make_owned_dir(
    ctx: &RunContext,
    path: &Path,
    owner: &str,
    group: &str,
) -> Result<(), FatalStepError> {
    let quoted = shell_quote(&path.display().to_string());
    let command = CommandLine::new(format!(
        "mkdir -p {} && chown {}:{} {}",
        quoted, owner, group, quoted
    ));

    let result = ctx.run(command).await;
    if !result.success() {
        return Err(FatalStepError::new(format!(
            "cannot create {} owned by {}:{}",
            path.display(),
            owner,
            group
        ))
        .with_output(&result.output));
    }
    Ok(())
}
