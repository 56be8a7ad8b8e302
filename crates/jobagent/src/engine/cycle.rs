//! Full-cycle orchestration across all configured platforms.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::pacing::Pacer;
use super::queries::QueryPlanner;
use super::runner::{PlatformRunner, RunnerConfig, RunnerError};
use crate::artifact::ResumeProvider;
use crate::browser::BrowserSession;
use crate::config::PlatformCredentials;
use crate::ledger::OutcomeLedger;
use crate::notify::Notifier;
use crate::platforms::PlatformSpec;
use crate::profile::AnswerBook;

/// One platform enrolled in the cycle, with its credentials.
pub struct PlatformRegistration {
    pub spec: &'static PlatformSpec,
    pub credentials: PlatformCredentials,
}

/// Runs every registered platform once per invocation, sequentially, and
/// aggregates totals. Errors are contained per platform: one platform's
/// failed run never touches the next one.
pub struct CycleOrchestrator {
    registrations: Vec<PlatformRegistration>,
    planner: QueryPlanner,
    book: AnswerBook,
    ledger: Arc<dyn OutcomeLedger>,
    notifier: Arc<dyn Notifier>,
    resume: Arc<dyn ResumeProvider>,
    pacer: Arc<dyn Pacer>,
    config: RunnerConfig,
}

impl CycleOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registrations: Vec<PlatformRegistration>,
        planner: QueryPlanner,
        book: AnswerBook,
        ledger: Arc<dyn OutcomeLedger>,
        notifier: Arc<dyn Notifier>,
        resume: Arc<dyn ResumeProvider>,
        pacer: Arc<dyn Pacer>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            registrations,
            planner,
            book,
            ledger,
            notifier,
            resume,
            pacer,
            config,
        }
    }

    /// Execute one full application cycle and return the total number of
    /// applications submitted.
    pub async fn run_cycle(&self, session: &dyn BrowserSession) -> u32 {
        info!("cycle start");
        let mut total: u32 = 0;

        for registration in &self.registrations {
            let platform = registration.spec.name;

            if !registration.credentials.is_complete() {
                warn!(platform, "credentials not configured; skipping platform");
                continue;
            }
            if self.planner.is_empty() {
                warn!("no search queries configured; nothing to do");
                break;
            }

            let runner = PlatformRunner::new(
                registration.spec,
                &registration.credentials,
                &self.planner,
                &self.book,
                self.ledger.as_ref(),
                self.notifier.as_ref(),
                self.resume.as_ref(),
                self.pacer.as_ref(),
                &self.config,
            );

            match runner.run(session).await {
                Ok(applied) => {
                    info!(platform, applied, "platform cycle complete");
                    total += applied;
                }
                Err(err @ RunnerError::Challenge { .. }) => {
                    // Surfaced distinctly: retrying is pointless until an
                    // operator clears the checkpoint.
                    error!(platform, error = %err, "platform run aborted by challenge");
                }
                Err(err) => {
                    error!(platform, error = %err, "platform run aborted");
                }
            }
        }

        match self.ledger.cycle_stats(Utc::now().date_naive()) {
            Ok(stats) => {
                if let Err(err) = self.notifier.notify_cycle_summary(&stats) {
                    warn!(error = %err, "cycle summary notification failed");
                }
            }
            Err(err) => {
                warn!(error = %err, "could not summarize cycle from ledger");
            }
        }

        info!(total, "cycle complete");
        total
    }
}
