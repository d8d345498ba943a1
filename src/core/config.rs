//! Host settings loaded from YAML

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the stack lives on this host and who owns it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Home of the high availability (grid) installation
    pub grid_home: String,

    /// Home of the database installation
    pub db_home: String,

    /// Base directory for database admin files
    pub oracle_base: String,

    /// OS user owning the database installation
    pub db_owner: String,

    /// OS group owning the database installation
    pub db_group: String,

    /// Identity the runbook must be started as
    pub privileged_user: String,

    /// Run levels the host may be in when the runbook starts
    pub accepted_runlevels: Vec<String>,

    /// Path of the oratab file
    pub oratab: String,

    /// Directory for the exported parameter file
    pub work_dir: String,

    /// How long waiting steps keep polling
    pub poll: PollSettings,
}

/// Polling bounds for waiting steps
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSettings {
    /// Status checks before giving up
    pub attempts: usize,

    /// Seconds between checks
    pub interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            attempts: 60,
            interval_secs: 10,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_home: "/u01/app/grid/product/19.0.0/grid".to_string(),
            db_home: "/u01/app/oracle/product/19.0.0/dbhome_1".to_string(),
            oracle_base: "/u01/app/oracle".to_string(),
            db_owner: "oracle".to_string(),
            db_group: "oinstall".to_string(),
            privileged_user: "root".to_string(),
            accepted_runlevels: vec!["3".to_string(), "5".to_string()],
            oratab: "/etc/oratab".to_string(),
            work_dir: "/var/tmp/rehost".to_string(),
            poll: PollSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Parse settings from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Default settings location, `<config dir>/rehost/settings.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rehost").join("settings.yaml"))
    }

    /// Load from an explicit path, else the default location if present,
    /// else built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("grid_home", &self.grid_home),
            ("db_home", &self.db_home),
            ("oracle_base", &self.oracle_base),
            ("db_owner", &self.db_owner),
            ("db_group", &self.db_group),
            ("privileged_user", &self.privileged_user),
            ("oratab", &self.oratab),
            ("work_dir", &self.work_dir),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                bail!("'{}' must not be empty", field);
            }
        }

        if self.accepted_runlevels.is_empty() {
            bail!("'accepted_runlevels' must list at least one run level");
        }

        if self.poll.attempts == 0 {
            bail!("'poll.attempts' must be at least 1");
        }

        Ok(())
    }
}
