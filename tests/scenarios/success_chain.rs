//! Test: Success Chain - every step runs once, in declared order

use crate::helpers::*;

#[tokio::test]
async fn test_all_steps_in_order() {
    let result = run_with_shell(&abc(), None, MockShell::new()).await;

    assert!(result.is_success());
    assert_sections(&result, &["entering A", "entering B", "entering C"]);
    assert_eq!(result.shell.lines(), vec!["echo a", "echo b", "echo c"]);
    assert_eq!(result.summary().executed(), vec!["A", "B", "C"]);
    assert!(result.summary().skipped().is_empty());
}

/// The section marker precedes the step's commands, and each command's trace
/// precedes the next section
#[tokio::test]
async fn test_trace_ordering() {
    let result = run_with_shell(&abc(), None, MockShell::new()).await;

    assert_eq!(
        result.trace.timeline(),
        vec![
            "entering A",
            "running: echo a",
            "entering B",
            "running: echo b",
            "entering C",
            "running: echo c",
        ]
    );
}

#[tokio::test]
async fn test_listing_leaves_pipeline_runnable() {
    let pipeline = abc();
    assert_eq!(pipeline.names(), vec!["A", "B", "C"]);
    assert_eq!(pipeline.names(), vec!["A", "B", "C"]);

    let result = run_with_shell(&pipeline, None, MockShell::new()).await;
    assert_eq!(result.summary().executed(), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_summary_timestamps() {
    let result = run_with_shell(&abc(), None, MockShell::new()).await;
    let summary = result.summary();

    assert!(summary.completed_at.is_some());
    assert!(summary.completed_at.unwrap() >= summary.started_at);
}
