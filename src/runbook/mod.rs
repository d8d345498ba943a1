//! The shipped runbook: move an Oracle Restart stack to a new host name and
//! rename its database
//!
//! The operator has already renamed the machine. The steps stop the
//! database, take the stack down, rewrite the network and registry files,
//! bring the stack back, rename the database and register it again.

pub mod action;

pub use action::Action;

use crate::core::parse::ServiceState;
use crate::core::{Pipeline, RunContext, RunError, Settings, Step, Targets};
use crate::execution::CommandLine;
use crate::system::{Accepted, Service, Substitution};
use std::path::PathBuf;

/// Text parameter file exported from the old database
pub fn pfile_path(settings: &Settings, targets: &Targets) -> PathBuf {
    PathBuf::from(&settings.work_dir).join(format!("init{}.ora", targets.old_id))
}

/// Set the ambient environment every step starts from
pub fn prepare(ctx: &mut RunContext, settings: &Settings, targets: &Targets) {
    ctx.set_env("ORACLE_HOME", &settings.db_home);
    ctx.set_env("ORACLE_BASE", &settings.oracle_base);
    ctx.set_env("ORACLE_SID", &targets.old_id);
}

/// Rewrite `(HOST = ...)` values naming the old host, bare or with any
/// domain, to the new host; addresses of other machines stay as they are
fn host_substitution(targets: &Targets) -> Substitution {
    let value = |host: &str| format!(r"{}(?:\.[^)\s]*)?", regex::escape(host));
    Substitution::new(
        format!(r"(?i)(\(\s*HOST\s*=\s*){}(\s*\))", value(&targets.old_host)),
        format!("${{1}}{}${{2}}", targets.new_host),
    )
    .applied_when(format!(r"(?i)\(\s*HOST\s*=\s*{}\s*\)", value(&targets.new_host)))
}

fn oratab_substitution(targets: &Targets) -> Substitution {
    Substitution::new(
        format!("(?m)^{}:", regex::escape(&targets.old_id)),
        format!("{}:", targets.new_id),
    )
    .applied_when(format!("(?m)^{}:", regex::escape(&targets.new_id)))
}

/// Point the exported parameter file at the new name: `db_name` must change,
/// the audit destination changes when it follows the usual layout
fn pfile_substitutions(targets: &Targets) -> Vec<Substitution> {
    let old = regex::escape(&targets.old_id);
    let new = &targets.new_id;
    vec![
        Substitution::new(
            format!(r#"(?im)^(\s*\*?\.?db_name\s*=\s*['"]?){}\b"#, old),
            format!("${{1}}{}", new),
        )
        .applied_when(format!(
            r#"(?im)^\s*\*?\.?db_name\s*=\s*['"]?{}\b"#,
            regex::escape(new)
        )),
        Substitution::new(
            format!(r"(?i)(/admin/){}(/adump)", old),
            format!("${{1}}{}${{2}}", new),
        )
        .optional(),
    ]
}

fn roothas(settings: &Settings, args: &str) -> CommandLine {
    let grid = &settings.grid_home;
    let line = format!(
        "{grid}/perl/bin/perl -I{grid}/perl/lib -I{grid}/crs/install {grid}/crs/install/roothas.pl{args}",
        grid = grid,
        args = args
    );
    CommandLine::new(line)
}

/// Build the runbook for one rename
pub fn build(settings: &Settings, targets: &Targets) -> Result<Pipeline<Action>, RunError> {
    let grid = settings.grid_home.as_str();
    let db = settings.db_home.as_str();
    let owner = settings.db_owner.clone();
    let old = targets.old_id.as_str();
    let new = targets.new_id.as_str();

    let old_database = Service::Database {
        id: old.to_string(),
        home: db.to_string(),
        owner: owner.clone(),
    };
    let new_database = Service::Database {
        id: new.to_string(),
        home: db.to_string(),
        owner: owner.clone(),
    };
    let has = Service::HighAvailability {
        home: grid.to_string(),
    };

    let pfile = pfile_path(settings, targets);
    let network_admin = PathBuf::from(grid).join("network/admin");
    let tns_admin = PathBuf::from(db).join("network/admin");
    let new_spfile = PathBuf::from(db).join(format!("dbs/spfile{}.ora", new));

    let in_grid = |action: Action| action.with_env("ORACLE_HOME", grid);
    let as_new = |action: Action| action.with_env("ORACLE_SID", new);

    let steps = vec![
        Step::new("stop_database", Action::Stop(old_database.clone())),
        Step::new(
            "export_pfile",
            Action::ExportPfile {
                database: old_database.clone(),
                run_as: owner.clone(),
                group: settings.db_group.clone(),
                pfile: pfile.clone(),
                fallback_spfile: PathBuf::from(db).join(format!("dbs/spfile{}.ora", old)),
            },
        ),
        Step::new(
            "remove_database_resource",
            Action::Command {
                command: CommandLine::new(format!(
                    "{}/bin/srvctl remove database -d {} -noprompt",
                    db, old
                ))
                .run_as(owner.clone()),
                // PRCD-1120: no such resource
                accept: Accepted::new(&[1, 2], &["PRCD-1120"]),
            },
        ),
        Step::new("stop_has", in_grid(Action::Stop(has.clone()))),
        Step::new(
            "deconfigure_has",
            in_grid(Action::Command {
                command: roothas(settings, " -deconfig -force"),
                accept: Accepted::nothing(),
            }),
        ),
        Step::new(
            "update_listener",
            Action::EditFile {
                path: network_admin.join("listener.ora"),
                substitutions: vec![host_substitution(targets)],
            },
        ),
        Step::new(
            "update_tnsnames",
            Action::EditFile {
                path: tns_admin.join("tnsnames.ora"),
                // aliases may address this machine as localhost or by IP
                substitutions: vec![
                    host_substitution(targets).optional(),
                    Substitution::word(old, new),
                ],
            },
        ),
        Step::new(
            "update_oratab",
            Action::EditFile {
                path: PathBuf::from(&settings.oratab),
                substitutions: vec![oratab_substitution(targets)],
            },
        ),
        Step::new(
            "reconfigure_has",
            in_grid(Action::Command {
                command: roothas(settings, ""),
                accept: Accepted::nothing(),
            }),
        ),
        Step::new("start_has", in_grid(Action::Start(has.clone()))),
        Step::new(
            "wait_for_has",
            in_grid(Action::WaitFor {
                service: has,
                state: ServiceState::Running,
                poll: settings.poll.clone(),
            }),
        ),
        Step::new(
            "mount_database",
            Action::Sql {
                body: format!("STARTUP MOUNT PFILE='{}';", pfile.display()),
                run_as: owner.clone(),
                // ORA-01081: instance already started
                accept: vec!["ORA-01081".to_string()],
            },
        ),
        Step::new(
            "rename_database",
            Action::Command {
                command: CommandLine::new(format!(
                    "echo Y | \"$ORACLE_HOME/bin/nid\" TARGET=/ DBNAME={}",
                    new
                ))
                .run_as(owner.clone()),
                accept: Accepted::nothing(),
            },
        ),
        Step::new(
            "update_pfile",
            Action::EditFile {
                path: pfile.clone(),
                substitutions: pfile_substitutions(targets),
            },
        ),
        Step::new(
            "create_audit_dir",
            Action::MakeDir {
                path: PathBuf::from(&settings.oracle_base).join(format!("admin/{}/adump", new)),
                owner: owner.clone(),
                group: settings.db_group.clone(),
            },
        ),
        Step::new(
            "create_spfile",
            as_new(Action::Sql {
                body: format!(
                    "CREATE SPFILE='{}' FROM PFILE='{}';",
                    new_spfile.display(),
                    pfile.display()
                ),
                run_as: owner.clone(),
                accept: Vec::new(),
            }),
        ),
        Step::new(
            "add_database_resource",
            Action::Command {
                command: CommandLine::new(format!(
                    "{db}/bin/srvctl add database -d {new} -o {db} -p {spfile}",
                    db = db,
                    new = new,
                    spfile = new_spfile.display()
                ))
                .run_as(owner.clone()),
                accept: Accepted::new(&[1, 2], &["already exists"]),
            },
        ),
        Step::new("start_database", Action::Start(new_database.clone())),
        Step::new(
            "wait_for_database",
            Action::WaitFor {
                service: new_database,
                state: ServiceState::Running,
                poll: settings.poll.clone(),
            },
        ),
        Step::new(
            "verify_database_name",
            as_new(Action::VerifyDatabaseName {
                run_as: owner,
                expected: new.to_string(),
            }),
        ),
    ];

    Pipeline::new(steps)
}
