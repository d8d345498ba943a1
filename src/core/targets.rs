//! The identity a run moves the host to

use crate::core::RunError;
use regex::Regex;
use std::sync::OnceLock;

/// Old and new hostnames plus old and new database identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub old_host: String,
    pub new_host: String,
    pub old_id: String,
    pub new_id: String,
}

impl Targets {
    /// Validate and build the targets
    pub fn new(
        old_host: impl Into<String>,
        new_host: impl Into<String>,
        old_id: impl Into<String>,
        new_id: impl Into<String>,
    ) -> Result<Self, RunError> {
        let targets = Self {
            old_host: old_host.into(),
            new_host: new_host.into(),
            old_id: old_id.into(),
            new_id: new_id.into(),
        };

        for host in [&targets.old_host, &targets.new_host] {
            if !is_hostname(host) {
                return Err(RunError::InvalidTarget(format!(
                    "'{}' is not a valid hostname",
                    host
                )));
            }
        }
        for id in [&targets.old_id, &targets.new_id] {
            if !is_identifier(id) {
                return Err(RunError::InvalidTarget(format!(
                    "'{}' is not a valid database identifier (letter first, then letters, digits or _, at most 8)",
                    id
                )));
            }
        }
        if targets.old_id.eq_ignore_ascii_case(&targets.new_id) {
            return Err(RunError::InvalidTarget(format!(
                "old and new identifiers are both '{}'",
                targets.old_id
            )));
        }

        Ok(targets)
    }

    /// Placeholder targets for rendering the step list without running it
    pub fn placeholder() -> Self {
        Self {
            old_host: "OLD_HOST".to_string(),
            new_host: "NEW_HOST".to_string(),
            old_id: "OLD_ID".to_string(),
            new_id: "NEW_ID".to_string(),
        }
    }
}

fn is_identifier(id: &str) -> bool {
    static ID: OnceLock<Regex> = OnceLock::new();
    ID.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,7}$").expect("valid regex"))
        .is_match(id)
}

fn is_hostname(host: &str) -> bool {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    let label = LABEL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("valid regex")
    });
    !host.is_empty() && host.len() <= 253 && host.split('.').all(|part| label.is_match(part))
}
