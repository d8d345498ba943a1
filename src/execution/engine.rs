//! Main execution engine - runs a pipeline's steps in order, optionally
//! resuming at a named step

use crate::{
    core::{Pipeline, RunContext, RunError, RunSummary, StepAction, StepState},
    execution::TraceEvent,
};
use std::time::Instant;
use tracing::{error, info};

/// Runs pipelines one step at a time
#[derive(Debug, Default)]
pub struct ExecutionEngine;

impl ExecutionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Execute the pipeline
    ///
    /// Steps before `resume_from` are reported as skipped and never invoked.
    /// The first step error ends the run; later steps are not entered.
    pub async fn execute<A: StepAction>(
        &self,
        pipeline: &Pipeline<A>,
        resume_from: Option<&str>,
        ctx: &mut RunContext,
    ) -> Result<RunSummary, RunError> {
        let start = pipeline.start_index(resume_from)?;
        let total_steps = pipeline.len();
        let mut summary = RunSummary::new(pipeline.names());

        info!(
            "Starting run {} ({} steps, starting at {})",
            summary.run_id,
            total_steps,
            resume_from.unwrap_or("the beginning")
        );
        ctx.reporter().emit(TraceEvent::RunStarted {
            run_id: summary.run_id,
            total_steps,
            resume_from: resume_from.map(str::to_string),
        });

        for (index, step) in pipeline.steps().iter().enumerate() {
            if index < start {
                ctx.reporter().emit(TraceEvent::StepSkipped {
                    step: step.name.clone(),
                });
                summary.mark(index, StepState::Skipped);
                continue;
            }

            ctx.reporter().announce_section(&step.name, index + 1, total_steps);
            let started = Instant::now();

            if let Err(source) = step.perform(ctx).await {
                error!("Step {} failed: {}", step.name, source);
                ctx.reporter().emit(TraceEvent::StepFailed {
                    step: step.name.clone(),
                    message: source.message.clone(),
                });
                return Err(RunError::Step {
                    step: step.name.clone(),
                    source,
                });
            }

            summary.mark(index, StepState::Executed);
            ctx.reporter().emit(TraceEvent::StepCompleted {
                step: step.name.clone(),
                elapsed: started.elapsed(),
            });
        }

        summary.complete();
        ctx.reporter().emit(TraceEvent::RunCompleted {
            run_id: summary.run_id,
            executed: summary.executed().len(),
            skipped: summary.skipped().len(),
        });
        info!("Run {} finished", summary.run_id);

        Ok(summary)
    }
}
