//! The application flow state machine.
//!
//! Drives one listing's wizard from initiation to a terminal outcome. Each
//! step is a pure decision over which indicator is currently visible,
//! evaluated in priority order: confirmation, submit control, review
//! control, then a generic form step. The step count is bounded; a wizard
//! that never terminates is abandoned.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::controls::{find_control, text_matches};
use super::forms::FormFiller;
use super::pacing::Pacer;
use crate::artifact::ResumeProvider;
use crate::browser::{BrowserError, BrowserSession, ElementHandle};
use crate::platforms::PlatformSpec;
use crate::profile::AnswerBook;

/// How an ambiguous post-submit state (no confirmation detected within the
/// bounded wait) is resolved. Some platforms submit silently, so the
/// default records the application as submitted; the strict variant records
/// a failure for manual review instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPolicy {
    OptimisticApplied,
    StrictConfirmation,
}

#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Upper bound on wizard steps before the flow is abandoned.
    pub step_cap: u32,
    pub submit_policy: SubmissionPolicy,
    /// How long to wait for a confirmation indicator after submitting.
    pub confirmation_wait: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            step_cap: 10,
            submit_policy: SubmissionPolicy::OptimisticApplied,
            confirmation_wait: Duration::from_secs(8),
        }
    }
}

/// Terminal result of one flow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Applied,
    /// The listing cannot be applied to in-platform (no quick-apply
    /// control, or the control leads to an external site).
    Skipped { reason: String },
    /// The flow got stuck with nothing actionable on screen.
    Aborted { reason: String },
    /// The flow ran but did not complete.
    Failed { reason: String },
}

/// What the current wizard screen offers, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepDecision {
    Confirmed,
    Submit(ElementHandle),
    Review(ElementHandle),
    FormStep,
}

pub struct FlowDriver<'a> {
    spec: &'a PlatformSpec,
    book: &'a AnswerBook,
    resume: &'a dyn ResumeProvider,
    pacer: &'a dyn Pacer,
    config: &'a FlowConfig,
}

impl<'a> FlowDriver<'a> {
    pub fn new(
        spec: &'a PlatformSpec,
        book: &'a AnswerBook,
        resume: &'a dyn ResumeProvider,
        pacer: &'a dyn Pacer,
        config: &'a FlowConfig,
    ) -> Self {
        Self {
            spec,
            book,
            resume,
            pacer,
            config,
        }
    }

    /// Drive the flow on the currently open listing page to a terminal
    /// outcome. Expected absences (missing buttons, unmatched fields) are
    /// handled internally; only session-level failures surface as errors.
    pub async fn run(&self, session: &dyn BrowserSession) -> Result<FlowOutcome, BrowserError> {
        let Some(apply) = find_control(session, &self.spec.flow.open_apply).await? else {
            return Ok(FlowOutcome::Skipped {
                reason: "quick-apply control not found".to_string(),
            });
        };

        if !self.spec.flow.external_markers.is_empty() {
            let label = session.text(apply).await.unwrap_or_default();
            if text_matches(&label, self.spec.flow.external_markers) {
                return Ok(FlowOutcome::Skipped {
                    reason: "application redirects to an external site".to_string(),
                });
            }
        }

        self.pacer.pause(0.5).await;
        session.click(apply).await?;
        self.pacer.pause(1.0).await;

        let filler = FormFiller::new(&self.spec.flow, self.book, self.pacer);

        for step in 0..self.config.step_cap {
            self.pacer.pause(0.8).await;

            let decision = self.decide(session).await?;
            debug!(step, ?decision, "flow step");

            match decision {
                StepDecision::Confirmed => {
                    info!(platform = self.spec.name, "submission confirmed");
                    self.dismiss_dialogs(session).await;
                    return Ok(FlowOutcome::Applied);
                }
                StepDecision::Submit(control) => {
                    filler.fill_visible_fields(session).await?;
                    self.pacer.pause(0.5).await;
                    session.click(control).await?;
                    self.pacer.pause(1.5).await;

                    if self.await_confirmation(session).await? {
                        info!(platform = self.spec.name, "submission confirmed");
                        self.dismiss_dialogs(session).await;
                        return Ok(FlowOutcome::Applied);
                    }

                    return match self.config.submit_policy {
                        SubmissionPolicy::OptimisticApplied => {
                            warn!(
                                platform = self.spec.name,
                                "confirmation not detected after submit; recording as applied"
                            );
                            self.dismiss_dialogs(session).await;
                            Ok(FlowOutcome::Applied)
                        }
                        SubmissionPolicy::StrictConfirmation => {
                            self.dismiss_dialogs(session).await;
                            Ok(FlowOutcome::Failed {
                                reason: "submission not confirmed".to_string(),
                            })
                        }
                    };
                }
                StepDecision::Review(control) => {
                    filler.fill_visible_fields(session).await?;
                    self.pacer.pause(0.3).await;
                    session.click(control).await?;
                }
                StepDecision::FormStep => {
                    filler.fill_visible_fields(session).await?;
                    self.attach_resume(session).await?;

                    match find_control(session, &self.spec.flow.next).await? {
                        Some(next) => {
                            session.click(next).await?;
                            self.pacer.pause(0.5).await;
                        }
                        None => {
                            warn!(
                                platform = self.spec.name,
                                step, "no actionable control; abandoning flow"
                            );
                            self.dismiss_dialogs(session).await;
                            return Ok(FlowOutcome::Aborted {
                                reason: format!("no actionable control at step {step}"),
                            });
                        }
                    }
                }
            }
        }

        warn!(
            platform = self.spec.name,
            cap = self.config.step_cap,
            "step cap exhausted without a terminal state"
        );
        self.dismiss_dialogs(session).await;
        Ok(FlowOutcome::Failed {
            reason: "flow did not complete".to_string(),
        })
    }

    /// Pure visibility decision for the current screen, evaluated in
    /// priority order.
    async fn decide(&self, session: &dyn BrowserSession) -> Result<StepDecision, BrowserError> {
        if find_control(session, &self.spec.flow.confirmation)
            .await?
            .is_some()
        {
            return Ok(StepDecision::Confirmed);
        }
        if let Some(control) = find_control(session, &self.spec.flow.submit).await? {
            return Ok(StepDecision::Submit(control));
        }
        if let Some(control) = find_control(session, &self.spec.flow.review).await? {
            return Ok(StepDecision::Review(control));
        }
        Ok(StepDecision::FormStep)
    }

    async fn await_confirmation(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<bool, BrowserError> {
        let start = std::time::Instant::now();
        loop {
            if find_control(session, &self.spec.flow.confirmation)
                .await?
                .is_some()
            {
                return Ok(true);
            }
            if start.elapsed() >= self.config.confirmation_wait {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn attach_resume(&self, session: &dyn BrowserSession) -> Result<(), BrowserError> {
        let Some(input) = session
            .find_first(&[self.spec.flow.file_input])
            .await?
        else {
            return Ok(());
        };

        match self.resume.ensure_available().await {
            Ok(path) => {
                match session.upload_file(input, &path).await {
                    Ok(()) => {
                        info!(platform = self.spec.name, "resume uploaded");
                        self.pacer.pause(0.5).await;
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        warn!(error = %err, "resume upload failed; continuing without it");
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "resume unavailable; continuing without it");
            }
        }

        Ok(())
    }

    /// Best-effort dismissal of whatever dialog is open; runs twice because
    /// discarding often raises a second confirmation dialog.
    async fn dismiss_dialogs(&self, session: &dyn BrowserSession) {
        for _ in 0..2 {
            match find_control(session, &self.spec.flow.dismiss).await {
                Ok(Some(control)) => {
                    if session.click(control).await.is_err() {
                        return;
                    }
                    self.pacer.pause(0.3).await;
                }
                _ => return,
            }
        }
    }
}
