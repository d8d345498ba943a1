//! Command-line interface

pub mod output;

use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

const MANUAL: &str = "\
Moves an Oracle Restart stack to a new host name and renames its database.

Run this after the operating system host name has been changed to --new-host.
The runbook stops the database, exports its parameters, unregisters it, takes
the high availability services down and deconfigures them, points the
listener.ora and tnsnames.ora addresses naming --old-host at --new-host
(entries for other machines are left alone), updates oratab, configures and starts the services
again, renames the database with nid, builds a new server parameter file,
registers and starts the renamed database and checks its name.

Every step is traced on stderr as it starts, together with each command it
runs. The run stops at the first failing step. After fixing the cause by hand,
rerun the same command with --skip <step> to resume at that step; --list shows
the step names in order.

Before any step runs, the tool checks that it is running as the privileged
user (unless --no-root), that the machine reports --new-host as its host name
and that the system is in an accepted runlevel.

Installation paths, the database owner and polling limits come from a YAML
settings file: --config, else <config dir>/rehost/settings.yaml, else the
built-in defaults.

Exit status: 0 when every step completed or on --list/--help/--man, 1 when a
precondition or a step failed, 2 on a usage error.";

/// Rename an Oracle Restart host and its database
#[derive(Debug, Parser, Clone)]
#[command(name = "rehost")]
#[command(version)]
#[command(about = "Rename an Oracle Restart host and its database", long_about = MANUAL)]
pub struct Cli {
    /// Host name the machine had; only network entries naming it are rewritten
    #[arg(long, value_name = "NAME", required_unless_present_any = ["list", "man"])]
    pub old_host: Option<String>,

    /// Host name the machine now has
    #[arg(long, value_name = "NAME", required_unless_present_any = ["list", "man"])]
    pub new_host: Option<String>,

    /// Current database identifier
    #[arg(long, value_name = "ID", required_unless_present_any = ["list", "man"])]
    pub old_id: Option<String>,

    /// Database identifier to rename to
    #[arg(long, value_name = "ID", required_unless_present_any = ["list", "man"])]
    pub new_id: Option<String>,

    /// Resume at the named step, skipping every step before it
    #[arg(long, value_name = "STEP")]
    pub skip: Option<String>,

    /// Print the step names in order and exit
    #[arg(long)]
    pub list: bool,

    /// Do not require the privileged user
    #[arg(long)]
    pub no_root: bool,

    /// Print the extended manual and exit
    #[arg(long)]
    pub man: bool,

    /// Settings file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// The extended usage printed by `--man`
    pub fn manual() -> String {
        Self::command().render_long_help().to_string()
    }
}
