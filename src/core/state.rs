//! Execution state models

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// State of a single step within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Not reached yet
    Pending,
    /// Before the resume point; never invoked
    Skipped,
    /// Invoked and returned successfully
    Executed,
}

/// Record of a step in a run summary
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: String,
    pub state: StepState,
}

/// What a successful run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the last step finished
    pub completed_at: Option<DateTime<Utc>>,

    /// Every step of the pipeline, in order
    pub steps: Vec<StepRecord>,
}

impl RunSummary {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: None,
            steps: names
                .into_iter()
                .map(|name| StepRecord {
                    name: name.to_string(),
                    state: StepState::Pending,
                })
                .collect(),
        }
    }

    pub fn mark(&mut self, index: usize, state: StepState) {
        if let Some(record) = self.steps.get_mut(index) {
            record.state = state;
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    fn names_in(&self, state: StepState) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|r| r.state == state)
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn executed(&self) -> Vec<&str> {
        self.names_in(StepState::Executed)
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.names_in(StepState::Skipped)
    }

    /// Wall-clock time of the run, once complete
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.completed_at
            .and_then(|done| done.signed_duration_since(self.started_at).to_std().ok())
    }
}
