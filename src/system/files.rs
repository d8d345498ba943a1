//! In-place editing of configuration files

use crate::core::{FatalStepError, RunContext};
use crate::execution::TraceEvent;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix of the copy kept of a file before its first edit
pub const BACKUP_SUFFIX: &str = ".rehost.bak";

/// One regex substitution applied to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Pattern to replace
    pub pattern: String,

    /// Replacement text; `$1` style group references are expanded
    pub replacement: String,

    /// Pattern that shows the edit was already made, letting a rerun pass
    /// when `pattern` no longer matches
    pub applied: Option<String>,

    /// Whether a file without any match is an error
    pub required: bool,
}

impl Substitution {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
            applied: None,
            required: true,
        }
    }

    /// Replace a whole word, case-insensitively, and accept the new word as
    /// proof of a previous run
    pub fn word(old: &str, new: &str) -> Self {
        Self {
            pattern: format!(r"(?i)\b{}\b", regex::escape(old)),
            replacement: new.replace('$', "$$"),
            applied: Some(format!(r"(?i)\b{}\b", regex::escape(new))),
            required: true,
        }
    }

    pub fn applied_when(mut self, pattern: impl Into<String>) -> Self {
        self.applied = Some(pattern.into());
        self
    }

    /// Let a file without any match pass untouched
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

fn compile(pattern: &str) -> Result<Regex, FatalStepError> {
    Regex::new(pattern)
        .map_err(|e| FatalStepError::new(format!("invalid pattern '{}': {}", pattern, e)))
}

/// Apply the substitutions to `path` in order and write the result back
///
/// A copy of the original is kept next to it before the first edit. A
/// required substitution whose pattern does not match is fatal unless its
/// `applied` pattern matches. Returns the number of replacements made.
pub async fn edit_file(
    ctx: &RunContext,
    path: &Path,
    substitutions: &[Substitution],
) -> Result<usize, FatalStepError> {
    let original = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FatalStepError::new(format!("cannot read {}: {}", path.display(), e)))?;

    let mut content = original.clone();
    let mut replacements = 0;

    for substitution in substitutions {
        let pattern = compile(&substitution.pattern)?;
        let count = pattern.find_iter(&content).count();

        if count == 0 && !substitution.required {
            debug!("'{}' not in {}, skipping", substitution.pattern, path.display());
            continue;
        }

        if count == 0 {
            let already = match &substitution.applied {
                Some(applied) => compile(applied)?.is_match(&content),
                None => false,
            };
            if !already {
                return Err(FatalStepError::new(format!(
                    "'{}' not found in {}",
                    substitution.pattern,
                    path.display()
                ))
                .with_output(&original));
            }
            ctx.reporter().emit(TraceEvent::AlreadySatisfied {
                detail: format!("{} already edited", path.display()),
            });
            continue;
        }

        content = pattern
            .replace_all(&content, substitution.replacement.as_str())
            .into_owned();
        replacements += count;
    }

    if content != original {
        let backup = backup_path(path);
        if tokio::fs::try_exists(&backup).await.unwrap_or(false) {
            debug!("Keeping existing backup {}", backup.display());
        } else {
            tokio::fs::copy(path, &backup).await.map_err(|e| {
                FatalStepError::new(format!("cannot back up {}: {}", path.display(), e))
            })?;
        }

        tokio::fs::write(path, &content)
            .await
            .map_err(|e| FatalStepError::new(format!("cannot write {}: {}", path.display(), e)))?;
        info!("Edited {} ({} replacements)", path.display(), replacements);
    }

    ctx.reporter().emit(TraceEvent::FileEdited {
        path: path.display().to_string(),
        replacements,
    });
    Ok(replacements)
}

/// `<path>.rehost.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}
