//! The application engine: extraction, flow driving, and orchestration.

pub mod cycle;
pub mod domain;
pub mod extract;
pub mod flow;
pub mod pacing;
pub mod queries;
pub mod runner;

pub(crate) mod controls;
mod forms;

#[cfg(test)]
mod tests;

pub use cycle::{CycleOrchestrator, PlatformRegistration};
pub use domain::{ApplicationOutcome, CycleStats, JobListing, OutcomeStatus};
pub use extract::ListingExtractor;
pub use flow::{FlowConfig, FlowDriver, FlowOutcome, SubmissionPolicy};
pub use pacing::{HumanPacer, NoDelayPacer, Pacer};
pub use queries::{QueryPlanner, SearchQuery};
pub use runner::{PlatformRunner, RunnerConfig, RunnerError};
