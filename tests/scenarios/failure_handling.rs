//! Test: Failure Handling - the first failing step ends the run

use crate::helpers::*;
use rehost::core::{Pipeline, RunError, Step};
use rehost::execution::TraceEvent;

#[tokio::test]
async fn test_failure_stops_the_run() {
    let pipeline = Pipeline::new(vec![
        Step::new("A", Task::Echo("a")),
        Step::new("B", Task::Fail("X failed")),
        Step::new("C", Task::Echo("c")),
    ])
    .unwrap();

    let result = run_with_shell(&pipeline, None, MockShell::new()).await;

    assert_sections(&result, &["entering A", "entering B"]);
    assert_eq!(result.shell.lines(), vec!["echo a"]);

    let err = result.error();
    assert_eq!(err.failed_step(), Some("B"));
    assert!(err.to_string().contains("X failed"));
}

#[tokio::test]
async fn test_failure_carries_command_output() {
    let shell = MockShell::new().respond("echo b", 1, "disk full\nno space left");

    let result = run_with_shell(&abc(), None, shell).await;

    let err = result.error();
    assert!(matches!(err, RunError::Step { step, .. } if step == "B"));
    assert_eq!(err.diagnostics(), ["disk full", "no space left"]);
    assert!(!result.trace.sections().contains(&"entering C".to_string()));
}

#[tokio::test]
async fn test_failure_is_traced() {
    let pipeline = Pipeline::new(vec![Step::new("only", Task::Fail("boom"))]).unwrap();

    let result = run_with_shell(&pipeline, None, MockShell::new()).await;

    assert!(result.trace.events().contains(&TraceEvent::StepFailed {
        step: "only".to_string(),
        message: "boom".to_string(),
    }));
    assert!(!result
        .trace
        .events()
        .iter()
        .any(|event| matches!(event, TraceEvent::RunCompleted { .. })));
}

/// A resumed run after a failure picks up at the failed step
#[tokio::test]
async fn test_resume_after_failure() {
    let failing = run_with_shell(&abc(), None, MockShell::new().respond("echo b", 1, "")).await;
    let step = failing.error().failed_step().unwrap().to_string();

    let resumed = run_with_shell(&abc(), Some(&step), MockShell::new()).await;

    assert!(resumed.is_success());
    assert_sections(&resumed, &["skipping A", "entering B", "entering C"]);
}
