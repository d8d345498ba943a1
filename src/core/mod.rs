//! Core domain models for the runbook
//!
//! This module defines the fundamental data structures: steps, the
//! pipeline that orders them, the run context they share, and the errors
//! that end a run.

pub mod config;
pub mod context;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod state;
pub mod step;
pub mod targets;

pub use config::{PollSettings, Settings};
pub use context::*;
pub use error::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
pub use targets::Targets;
