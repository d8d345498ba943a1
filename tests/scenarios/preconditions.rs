//! Test: Preconditions - a failed host check stops the run before any step

use crate::helpers::*;
use rehost::core::{RunError, Settings, Targets};
use rehost::execution::PreconditionGate;

fn gate(no_root: bool) -> PreconditionGate {
    let targets = Targets::new("db01", "db02", "ORCL", "SALES").unwrap();
    PreconditionGate::new(&Settings::default(), &targets, no_root)
}

fn host(user: &str, hostname: &str, runlevel: &str) -> MockShell {
    MockShell::new()
        .respond("id -un", 0, user)
        .respond("hostname", 0, hostname)
        .respond("runlevel", 0, runlevel)
}

#[tokio::test]
async fn test_passing_gate_runs_pipeline() {
    let result = run_gated(&abc(), &gate(false), host("root\n", "db02\n", "N 3\n")).await;

    assert!(result.is_success());
    assert_eq!(
        result.shell.lines(),
        vec!["id -un", "hostname", "runlevel", "echo a", "echo b", "echo c"]
    );
}

#[tokio::test]
async fn test_hostname_mismatch_runs_no_step() {
    let result = run_gated(&abc(), &gate(false), host("root", "db01", "N 3")).await;

    assert!(matches!(result.error(), RunError::Precondition(_)));
    assert!(result.trace.sections().is_empty());
    assert!(!result.shell.lines().iter().any(|line| line.starts_with("echo")));
}

#[tokio::test]
async fn test_checks_stop_at_first_failure() {
    let result = run_gated(&abc(), &gate(false), host("oracle", "db02", "N 3")).await;

    assert!(result.error().to_string().contains("must be run as root"));
    // hostname and runlevel are never checked
    assert_eq!(result.shell.lines(), vec!["id -un"]);
}

#[tokio::test]
async fn test_no_root_skips_identity() {
    let result = run_gated(&abc(), &gate(true), host("oracle", "db02", "N 5")).await;

    assert!(result.is_success());
    assert_eq!(result.shell.lines()[0], "hostname");
}

#[tokio::test]
async fn test_single_user_mode_rejected() {
    let result = run_gated(&abc(), &gate(false), host("root", "db02", "3 S")).await;

    assert!(result.error().to_string().contains("run level S"));
    assert!(result.trace.sections().is_empty());
}

#[tokio::test]
async fn test_failing_check_command() {
    let shell = MockShell::new().respond("id -un", 1, "id: cannot find name for user ID 4242");
    let result = run_gated(&abc(), &gate(false), shell).await;

    let err = result.error();
    assert!(err.to_string().contains("'id -un' exited with status 1"));
    assert_eq!(err.diagnostics(), ["id: cannot find name for user ID 4242"]);
}
