//! Outcome notifications.
//!
//! Rendering is done here so it can be unit-tested; delivery is a
//! boundary. The default adapter emits the rendered messages through
//! tracing, which is enough for operators tailing the service logs.

use std::fmt::Write as _;

use tracing::{debug, info};

use crate::engine::domain::{ApplicationOutcome, CycleStats};

/// Outbound notification hooks.
pub trait Notifier: Send + Sync {
    fn notify_single(&self, outcome: &ApplicationOutcome) -> Result<(), NotifyError>;
    fn notify_cycle_summary(&self, stats: &CycleStats) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

pub fn single_subject(outcome: &ApplicationOutcome) -> String {
    format!(
        "Applied: {} @ {} ({})",
        outcome.listing.title, outcome.listing.company, outcome.platform
    )
}

pub fn single_body(outcome: &ApplicationOutcome) -> String {
    format!(
        "An application was just submitted.\n\n\
         Platform:  {}\n\
         Company:   {}\n\
         Role:      {}\n\
         Link:      {}\n",
        outcome.platform, outcome.listing.company, outcome.listing.title, outcome.listing.url
    )
}

pub fn summary_subject(stats: &CycleStats) -> String {
    format!(
        "Job application report {} | {} applied, {} failed",
        stats.date, stats.applied, stats.failed
    )
}

pub fn summary_body(stats: &CycleStats) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "Application run summary");
    let _ = writeln!(body, "{}", "=".repeat(50));
    let _ = writeln!(body, "Date:        {}", stats.date);
    let _ = writeln!(body, "Applied:     {}", stats.applied);
    let _ = writeln!(
        body,
        "Skipped:     {}  (duplicate / not quick-apply)",
        stats.skipped
    );
    let _ = writeln!(body, "Failed:      {}", stats.failed);
    let _ = writeln!(body);
    let _ = writeln!(body, "Applications submitted:");
    let _ = writeln!(body, "{}", "-".repeat(40));
    if stats.companies.is_empty() {
        let _ = writeln!(body, "  (none)");
    } else {
        for (index, company) in stats.companies.iter().enumerate() {
            let _ = writeln!(body, "  {}. {}", index + 1, company);
        }
    }
    body
}

/// Notifier that renders messages into the service log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_single(&self, outcome: &ApplicationOutcome) -> Result<(), NotifyError> {
        info!("{}", single_subject(outcome));
        debug!("{}", single_body(outcome));
        Ok(())
    }

    fn notify_cycle_summary(&self, stats: &CycleStats) -> Result<(), NotifyError> {
        if stats.applied == 0 && stats.failed == 0 {
            debug!("nothing to report for {}", stats.date);
            return Ok(());
        }
        info!("{}", summary_subject(stats));
        info!("{}", summary_body(stats));
        Ok(())
    }
}
