//! Pipeline domain model

use crate::core::{error::RunError, step::Step};
use std::collections::HashSet;

/// An ordered, immutable list of uniquely named steps
#[derive(Debug, Clone)]
pub struct Pipeline<A> {
    steps: Vec<Step<A>>,
}

impl<A> Pipeline<A> {
    /// Create a pipeline, rejecting duplicate step names
    pub fn new(steps: Vec<Step<A>>) -> Result<Self, RunError> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.name.as_str()) {
                return Err(RunError::DuplicateStep(step.name.clone()));
            }
        }
        Ok(Self { steps })
    }

    /// Step names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn steps(&self) -> &[Step<A>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Get a step by name
    pub fn step(&self, name: &str) -> Option<&Step<A>> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Index of the step a run should start at
    ///
    /// `None` starts at the beginning; an unknown name is an error rather than
    /// a run that silently skips everything.
    pub fn start_index(&self, resume_from: Option<&str>) -> Result<usize, RunError> {
        match resume_from {
            None => Ok(0),
            Some(name) => self
                .steps
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| RunError::UnknownStep(name.to_string())),
        }
    }
}
