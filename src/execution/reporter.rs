//! Diagnostic reporter - progress trace for the operator, kept off stdout

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    RunStarted {
        run_id: Uuid,
        total_steps: usize,
        resume_from: Option<String>,
    },
    StepSkipped {
        step: String,
    },
    StepEntered {
        step: String,
        position: usize,
        total_steps: usize,
    },
    CommandStarted {
        command: String,
    },
    CommandFinished {
        exit_status: i32,
    },
    /// A non-zero result the step accepts as "already done"
    AlreadySatisfied {
        detail: String,
    },
    FileEdited {
        path: String,
        replacements: usize,
    },
    Polling {
        subject: String,
        attempt: usize,
        attempts: usize,
    },
    StepCompleted {
        step: String,
        elapsed: Duration,
    },
    StepFailed {
        step: String,
        message: String,
    },
    RunCompleted {
        run_id: Uuid,
        executed: usize,
        skipped: usize,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&TraceEvent) + Send + Sync>;

/// Fans trace events out to the registered handlers, in registration order
#[derive(Clone, Default)]
pub struct Reporter {
    handlers: Vec<EventHandler>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&TraceEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Emit an event to all handlers
    pub fn emit(&self, event: TraceEvent) {
        debug!(?event, "trace");
        for handler in &self.handlers {
            handler(&event);
        }
    }

    /// Announce that a named section is about to run
    pub fn announce_section(&self, step: &str, position: usize, total_steps: usize) {
        self.emit(TraceEvent::StepEntered {
            step: step.to_string(),
            position,
            total_steps,
        });
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
