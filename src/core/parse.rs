//! Parsers for external tool output
//!
//! Each parser documents the exact shape it accepts. Anything else is a
//! `FatalStepError` carrying the raw output, never a guess.

use crate::core::FatalStepError;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Where the stack's stored configuration keeps the server parameter file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpfileLocation {
    /// `Spfile: <path>`
    Stored(PathBuf),
    /// `Spfile:` with an empty value: no stored configuration file
    NotStored,
}

/// Running state of a managed service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Running => write!(f, "running"),
            ServiceState::Stopped => write!(f, "stopped"),
        }
    }
}

fn unrecognized(what: &str, output: &str) -> FatalStepError {
    FatalStepError::new(format!("unrecognized {} output", what)).with_output(output)
}

/// Output of `runlevel`: `<previous> <current>`, e.g. `N 3`
///
/// Returns the current level. `unknown` (no runlevel recorded) is rejected.
pub fn runlevel(output: &str) -> Result<String, FatalStepError> {
    let tokens: Vec<&str> = output.split_whitespace().collect();
    match tokens.as_slice() {
        [previous, current]
            if is_level(previous) && is_level(current) && *current != "N" =>
        {
            Ok(current.to_string())
        }
        _ => Err(unrecognized("runlevel", output)),
    }
}

fn is_level(token: &str) -> bool {
    token == "N" || (token.len() == 1 && token.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Output consisting of exactly one token, such as `id -un` or `hostname`
pub fn single_token(what: &str, output: &str) -> Result<String, FatalStepError> {
    let tokens: Vec<&str> = output.split_whitespace().collect();
    match tokens.as_slice() {
        [token] => Ok(token.to_string()),
        _ => Err(unrecognized(what, output)),
    }
}

/// Output of `srvctl config database -d <id>`
///
/// Recognises one `Spfile:` line; its value is the stored path, or empty
/// when the database has no stored parameter file.
pub fn spfile_location(output: &str) -> Result<SpfileLocation, FatalStepError> {
    static SPFILE: OnceLock<Regex> = OnceLock::new();
    let re = SPFILE.get_or_init(|| {
        Regex::new(r"(?m)^Spfile:[ \t]*(\S*)[ \t]*$").expect("valid regex")
    });

    let mut matches = re.captures_iter(output);
    let location = match (matches.next(), matches.next()) {
        (Some(caps), None) => match caps.get(1).map(|m| m.as_str()) {
            Some(path) if !path.is_empty() => SpfileLocation::Stored(PathBuf::from(path)),
            _ => SpfileLocation::NotStored,
        },
        _ => return Err(unrecognized("stored configuration", output)),
    };
    Ok(location)
}

/// Output of `srvctl status database -d <id>`
pub fn database_status(output: &str) -> Result<ServiceState, FatalStepError> {
    if output.contains("is not running") {
        Ok(ServiceState::Stopped)
    } else if output.contains("is running") {
        Ok(ServiceState::Running)
    } else {
        Err(unrecognized("database status", output))
    }
}

/// Output of `crsctl check has`
///
/// `CRS-4638` means online, `CRS-4639` means the service cannot be contacted.
pub fn has_status(output: &str) -> Result<ServiceState, FatalStepError> {
    if output.contains("CRS-4638") {
        Ok(ServiceState::Running)
    } else if output.contains("CRS-4639") {
        Ok(ServiceState::Stopped)
    } else {
        Err(unrecognized("high availability status", output))
    }
}

/// Output of a headings-off `select name from v$database`
pub fn database_name(output: &str) -> Result<String, FatalStepError> {
    static NAME: OnceLock<Regex> = OnceLock::new();
    let re = NAME.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]*$").expect("valid regex"));

    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    match lines.as_slice() {
        [name] if re.is_match(name) => Ok(name.to_string()),
        _ => Err(unrecognized("database name", output)),
    }
}

/// Lines carrying an error code that marks a failed tool run even when the
/// tool exits zero: `ORA-` (database), `SP2-` (script runner), `NID-` (rename utility)
pub fn tool_errors(output: &str) -> Vec<&str> {
    const PREFIXES: [&str; 3] = ["ORA-", "SP2-", "NID-"];
    output
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            PREFIXES.iter().any(|prefix| line.starts_with(prefix))
        })
        .collect()
}
