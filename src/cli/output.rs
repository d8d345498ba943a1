//! CLI output formatting

use crate::{
    core::{RunError, RunSummary},
    execution::TraceEvent,
};
use console::Emoji;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a trace event as one line for the diagnostic channel
///
/// Returns `None` for events that add nothing an operator needs to see.
pub fn format_trace_event(event: &TraceEvent) -> Option<String> {
    let line = match event {
        TraceEvent::RunStarted {
            run_id,
            total_steps,
            resume_from,
        } => format!(
            "{} Run {} ({} steps{})",
            ROCKET,
            style(&run_id.to_string()[..8]).dim(),
            total_steps,
            resume_from
                .as_ref()
                .map(|step| format!(", resuming at {}", step))
                .unwrap_or_default()
        ),
        TraceEvent::StepSkipped { step } => {
            style(format!("skipping {}", step)).dim().to_string()
        }
        TraceEvent::StepEntered {
            step,
            position,
            total_steps,
        } => format!(
            "{} entering section {} {}",
            SPINNER,
            style(step).cyan().bold(),
            style(format!("[{}/{}]", position, total_steps)).dim()
        ),
        TraceEvent::CommandStarted { command } => format!("  running: {}", command),
        TraceEvent::CommandFinished { exit_status } if *exit_status != 0 => {
            style(format!("  exit status {}", exit_status))
                .yellow()
                .to_string()
        }
        TraceEvent::CommandFinished { .. } => return None,
        TraceEvent::AlreadySatisfied { detail } => {
            format!("  {} already done: {}", INFO, detail)
        }
        TraceEvent::FileEdited { path, replacements } => {
            format!("  edited {} ({} replacements)", path, replacements)
        }
        TraceEvent::Polling {
            subject,
            attempt,
            attempts,
        } => style(format!("  waiting for {} ({}/{})", subject, attempt, attempts))
            .dim()
            .to_string(),
        TraceEvent::StepCompleted { step, elapsed } => format!(
            "{} {} {}",
            CHECK,
            style(step).green(),
            style(format_duration(*elapsed)).dim()
        ),
        TraceEvent::StepFailed { step, message } => {
            format!("{} {}: {}", CROSS, style(step).red(), message)
        }
        TraceEvent::RunCompleted { .. } => return None,
    };
    Some(line)
}

/// Format a failed run: the message, the indented diagnostics and a resume
/// hint when a step failed
pub fn format_failure(err: &RunError) -> String {
    let mut out = format!("{} {}", CROSS, style(err).red().bold());

    for line in err.diagnostics() {
        out.push_str(&format!("\n    {}", line));
    }

    if let Some(step) = err.failed_step() {
        out.push_str(&format!(
            "\n\nFix the cause, then resume with: {}",
            style(format!("--skip {}", step)).bold()
        ));
    }
    out
}

/// Format the end-of-run summary
pub fn format_summary(summary: &RunSummary) -> String {
    let elapsed = summary
        .elapsed()
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} Run {} completed {}: {} executed, {} skipped in {}",
        CHECK,
        style(&summary.run_id.to_string()[..8]).dim(),
        style("successfully").green(),
        summary.executed().len(),
        summary.skipped().len(),
        elapsed
    )
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
