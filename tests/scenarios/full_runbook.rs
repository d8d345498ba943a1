//! Test: Full Runbook - the shipped steps against a scratch directory tree

use crate::helpers::*;
use rehost::core::{PollSettings, RunError, Settings, Targets};
use rehost::runbook;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LISTENER: &str = "\
LISTENER =
  (DESCRIPTION_LIST =
    (DESCRIPTION =
      (ADDRESS = (PROTOCOL = TCP)(HOST = db01.example.com)(PORT = 1521))
      (ADDRESS = (PROTOCOL = IPC)(KEY = EXTPROC1521))
    )
  )
";

const TNSNAMES: &str = "\
ORCL =
  (DESCRIPTION =
    (ADDRESS = (PROTOCOL = TCP)(HOST = db01.example.com)(PORT = 1521))
    (CONNECT_DATA =
      (SERVER = DEDICATED)
      (SERVICE_NAME = orcl)
    )
  )

REPORTS =
  (DESCRIPTION =
    (ADDRESS = (PROTOCOL = TCP)(HOST = reports-srv.example.com)(PORT = 1521))
    (CONNECT_DATA = (SERVICE_NAME = reports))
  )
";

const ORATAB: &str = "\
# This file is used by ORACLE utilities.
+ASM:/u01/app/grid:N
ORCL:/u01/app/oracle/product/19.0.0/dbhome_1:N
";

const PFILE: &str = "\
ORCL.__db_cache_size=1207959552
*.audit_file_dest='/u01/app/oracle/admin/ORCL/adump'
*.control_files='/u01/oradata/ORCL/control01.ctl'
*.db_name='ORCL'
";

/// A host laid out under a temp dir, with the files the runbook edits
struct Host {
    root: TempDir,
    settings: Settings,
}

impl Host {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let at = |rel: &str| root.path().join(rel).display().to_string();

        let settings = Settings {
            grid_home: at("grid"),
            db_home: at("db"),
            oracle_base: at("base"),
            oratab: at("oratab"),
            work_dir: at("work"),
            poll: PollSettings {
                attempts: 2,
                interval_secs: 0,
            },
            ..Settings::default()
        };

        write(&root.path().join("grid/network/admin/listener.ora"), LISTENER);
        write(&root.path().join("db/network/admin/tnsnames.ora"), TNSNAMES);
        write(&root.path().join("oratab"), ORATAB);
        // stands in for the file the export step has the database write
        write(&root.path().join("work/initORCL.ora"), PFILE);

        Self { root, settings }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    async fn run(&self, resume_from: Option<&str>, shell: MockShell) -> ScenarioResult {
        let targets = targets();
        let pipeline = runbook::build(&self.settings, &targets).unwrap();
        run_prepared(&pipeline, resume_from, shell, |ctx| {
            runbook::prepare(ctx, &self.settings, &targets)
        })
        .await
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn targets() -> Targets {
    Targets::new("db01", "db02", "ORCL", "SALES").unwrap()
}

/// Answers the status and configuration queries of a healthy stack
fn healthy_stack() -> MockShell {
    MockShell::new()
        .respond(
            "srvctl config database",
            0,
            "Database unique name: ORCL\nSpfile: +DATA/ORCL/PARAMETERFILE/spfile.269.1\nPassword file:\n",
        )
        .respond("crsctl check has", 0, "CRS-4638: Oracle High Availability Services is online\n")
        .respond("srvctl status database", 0, "Database is running.\n")
        .respond("v$database", 0, "SALES\n")
}

#[tokio::test]
async fn test_full_run() {
    let host = Host::new();
    let result = host.run(None, healthy_stack()).await;

    assert!(result.is_success());
    assert_eq!(result.summary().executed().len(), 20);

    let listener = host.read("grid/network/admin/listener.ora");
    assert!(listener.contains("(HOST = db02)"));
    assert!(!listener.contains("db01"));

    let tnsnames = host.read("db/network/admin/tnsnames.ora");
    assert!(tnsnames.starts_with("SALES ="));
    assert!(tnsnames.contains("(SERVICE_NAME = SALES)"));
    assert!(tnsnames.contains("(HOST = db02)"));

    assert!(host.read("oratab").contains("\nSALES:/u01/app/oracle/product/19.0.0/dbhome_1:N\n"));

    let pfile = host.read("work/initORCL.ora");
    assert!(pfile.contains("*.db_name='SALES'"));
    assert!(pfile.contains("/admin/SALES/adump"));
    assert!(pfile.contains("/oradata/ORCL/control01.ctl"));

    assert_eq!(host.read("oratab.rehost.bak"), ORATAB);
}

#[tokio::test]
async fn test_other_hosts_in_tnsnames_untouched() {
    let host = Host::new();
    let result = host.run(None, healthy_stack()).await;
    assert!(result.is_success());

    let tnsnames = host.read("db/network/admin/tnsnames.ora");
    assert!(tnsnames.contains("(HOST = reports-srv.example.com)(PORT = 1521)"));
    assert!(tnsnames.contains("(SERVICE_NAME = reports)"));
    assert_eq!(tnsnames.matches("(HOST = db02)").count(), 1);
}

#[tokio::test]
async fn test_listener_without_old_host_fails() {
    let host = Host::new();
    write(
        &host.path("grid/network/admin/listener.ora"),
        &LISTENER.replace("db01.example.com", "db07.example.com"),
    );

    let result = host.run(None, healthy_stack()).await;

    assert_eq!(result.error().failed_step(), Some("update_listener"));
    assert!(host
        .read("grid/network/admin/listener.ora")
        .contains("(HOST = db07.example.com)"));
}

#[tokio::test]
async fn test_commands_and_environment() {
    let host = Host::new();
    let result = host.run(None, healthy_stack()).await;
    assert!(result.is_success());

    let grid = &host.settings.grid_home;
    let db = &host.settings.db_home;

    let stop_db = result.shell.find("srvctl stop database -d ORCL").unwrap();
    assert_eq!(stop_db.user(), Some("oracle"));
    assert_eq!(&stop_db.env()["ORACLE_HOME"], db);
    assert_eq!(stop_db.env()["ORACLE_SID"], "ORCL");

    let stop_has = result.shell.find("crsctl stop has").unwrap();
    assert_eq!(stop_has.user(), None);
    assert_eq!(&stop_has.env()["ORACLE_HOME"], grid);

    let export = result.shell.find("CREATE PFILE").unwrap();
    assert!(export
        .line()
        .contains("FROM SPFILE='+DATA/ORCL/PARAMETERFILE/spfile.269.1'"));

    let mount = result.shell.find("STARTUP MOUNT").unwrap();
    assert_eq!(mount.env()["ORACLE_SID"], "ORCL");
    assert_eq!(&mount.env()["ORACLE_HOME"], db);

    let nid = result.shell.find("bin/nid").unwrap();
    assert!(nid.line().contains("DBNAME=SALES"));
    assert_eq!(nid.user(), Some("oracle"));

    let spfile = result.shell.find("CREATE SPFILE").unwrap();
    assert_eq!(spfile.env()["ORACLE_SID"], "SALES");

    let add = result.shell.find("srvctl add database").unwrap();
    assert!(add.line().contains("-d SALES"));
    assert!(add.line().contains(&format!("-p {}/dbs/spfileSALES.ora", db)));

    let audit = result.shell.find("admin/SALES/adump").unwrap();
    assert!(audit.line().starts_with("mkdir -p "));
    assert!(audit.line().contains("chown oracle:oinstall"));

    // deconfigure strictly before reconfigure
    let lines = result.shell.lines();
    let deconfig = lines.iter().position(|l| l.ends_with("roothas.pl -deconfig -force"));
    let reconfig = lines.iter().position(|l| l.ends_with("roothas.pl"));
    assert!(deconfig.unwrap() < reconfig.unwrap());

    // overrides never leak into later steps
    let start_db = result.shell.find("srvctl start database -d SALES").unwrap();
    assert_eq!(&start_db.env()["ORACLE_HOME"], db);
    assert_eq!(start_db.env()["ORACLE_SID"], "ORCL");
}

#[tokio::test]
async fn test_missing_stored_spfile_uses_default_location() {
    let host = Host::new();
    let shell = healthy_stack().respond_first("srvctl config database", 0, "Spfile: \n");
    let result = host.run(None, shell).await;

    assert!(result.is_success());
    let export = result.shell.find("CREATE PFILE").unwrap();
    assert!(export
        .line()
        .contains(&format!("FROM SPFILE='{}/dbs/spfileORCL.ora'", host.settings.db_home)));
}

#[tokio::test]
async fn test_already_stopped_and_unregistered_are_fine() {
    let host = Host::new();
    let shell = MockShell::new()
        .respond("srvctl stop database", 2, "PRCC-1016 : ORCL was already stopped\n")
        .respond(
            "srvctl remove database",
            1,
            "PRCD-1120 : The resource for database ORCL could not be found.\n",
        )
        .respond("crsctl stop has", 1, "CRS-4639: Could not contact Oracle High Availability Services\n");
    let shell = shell_with_healthy_queries(shell);

    let result = host.run(None, shell).await;

    assert!(result.is_success());
}

#[tokio::test]
async fn test_failure_then_resume() {
    let host = Host::new();
    let failing = healthy_stack().respond_first(
        "roothas.pl -deconfig",
        25,
        "Died at /u01/app/grid/crs/install/crsutils.pm line 1.\n",
    );

    let result = host.run(None, failing).await;

    let err = result.error();
    assert_eq!(err.failed_step(), Some("deconfigure_has"));
    assert_eq!(err.diagnostics(), ["Died at /u01/app/grid/crs/install/crsutils.pm line 1."]);
    // nothing after the failed step touched the files
    assert_eq!(host.read("grid/network/admin/listener.ora"), LISTENER);
    assert!(!host.path("grid/network/admin/listener.ora.rehost.bak").exists());

    let resumed = host.run(Some("deconfigure_has"), healthy_stack()).await;

    assert!(resumed.is_success());
    assert_eq!(
        resumed.summary().skipped(),
        vec!["stop_database", "export_pfile", "remove_database_resource", "stop_has"]
    );
    assert!(resumed.shell.find("srvctl stop database").is_none());
    assert!(host.read("oratab").contains("SALES:"));
}

#[tokio::test]
async fn test_rerun_after_completion_keeps_files() {
    let host = Host::new();
    assert!(host.run(None, healthy_stack()).await.is_success());
    let listener = host.read("grid/network/admin/listener.ora");
    let pfile = host.read("work/initORCL.ora");

    let again = host.run(Some("update_listener"), healthy_stack()).await;

    assert!(again.is_success());
    assert_eq!(host.read("grid/network/admin/listener.ora"), listener);
    assert_eq!(host.read("work/initORCL.ora"), pfile);
    assert_eq!(host.read("work/initORCL.ora.rehost.bak"), PFILE);
}

#[tokio::test]
async fn test_stack_never_comes_online() {
    let host = Host::new();
    let shell = healthy_stack().respond_first(
        "crsctl check has",
        1,
        "CRS-4639: Could not contact Oracle High Availability Services\n",
    );

    let result = host.run(None, shell).await;

    let err = result.error();
    assert_eq!(err.failed_step(), Some("wait_for_has"));
    assert!(err.to_string().contains("not running after 2 checks"));
    assert_eq!(
        result
            .shell
            .lines()
            .iter()
            .filter(|line| line.contains("crsctl check has"))
            .count(),
        2
    );
}

#[tokio::test]
async fn test_renamed_database_reports_old_name() {
    let host = Host::new();
    let shell = healthy_stack().respond_first("v$database", 0, "ORCL\n");

    let result = host.run(None, shell).await;

    assert_eq!(result.error().failed_step(), Some("verify_database_name"));
    assert!(matches!(result.error(), RunError::Step { .. }));
}

fn shell_with_healthy_queries(shell: MockShell) -> MockShell {
    shell
        .respond("srvctl config database", 0, "Spfile: +DATA/ORCL/spfileorcl.ora\n")
        .respond("crsctl check has", 0, "CRS-4638: Oracle High Availability Services is online\n")
        .respond("srvctl status database", 0, "Database is running.\n")
        .respond("v$database", 0, "SALES\n")
}
