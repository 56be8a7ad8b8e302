//! One platform's full application cycle.
//!
//! Login, query iteration, page iteration, extraction, dedup filtering,
//! flow driving, and outcome recording. Errors local to one listing never
//! escalate past it; authentication problems abort the platform's run.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::controls::find_control;
use super::domain::{ApplicationOutcome, JobListing, OutcomeStatus};
use super::extract::ListingExtractor;
use super::flow::{FlowConfig, FlowDriver, FlowOutcome};
use super::pacing::Pacer;
use super::queries::QueryPlanner;
use crate::artifact::ResumeProvider;
use crate::browser::{BrowserError, BrowserSession};
use crate::config::PlatformCredentials;
use crate::ledger::{LedgerError, OutcomeLedger};
use crate::notify::Notifier;
use crate::platforms::{CredentialField, LoginStep, PlatformSpec};
use crate::profile::AnswerBook;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);
const LOGIN_FIELD_WAIT: Duration = Duration::from_secs(10);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);
const LISTING_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("{platform} authentication failed: {reason}")]
    Auth {
        platform: &'static str,
        reason: String,
    },
    /// A security checkpoint or CAPTCHA-like redirect. Distinct from a
    /// generic auth failure so an operator can supply fresh credentials
    /// out-of-band; never retried within the run.
    #[error("{platform} presented a verification challenge; operator action required")]
    Challenge { platform: &'static str },
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub max_applications_per_run: u32,
    pub result_pages_per_query: u32,
    /// How long to wait for the post-login URL before treating the login
    /// as failed.
    pub login_verify_wait: Duration,
    pub flow: FlowConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_applications_per_run: 50,
            result_pages_per_query: 3,
            login_verify_wait: Duration::from_secs(15),
            flow: FlowConfig::default(),
        }
    }
}

pub struct PlatformRunner<'a> {
    spec: &'static PlatformSpec,
    credentials: &'a PlatformCredentials,
    planner: &'a QueryPlanner,
    book: &'a AnswerBook,
    ledger: &'a dyn OutcomeLedger,
    notifier: &'a dyn Notifier,
    resume: &'a dyn ResumeProvider,
    pacer: &'a dyn Pacer,
    config: &'a RunnerConfig,
}

impl<'a> PlatformRunner<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spec: &'static PlatformSpec,
        credentials: &'a PlatformCredentials,
        planner: &'a QueryPlanner,
        book: &'a AnswerBook,
        ledger: &'a dyn OutcomeLedger,
        notifier: &'a dyn Notifier,
        resume: &'a dyn ResumeProvider,
        pacer: &'a dyn Pacer,
        config: &'a RunnerConfig,
    ) -> Self {
        Self {
            spec,
            credentials,
            planner,
            book,
            ledger,
            notifier,
            resume,
            pacer,
            config,
        }
    }

    /// Run one full cycle for this platform and return how many
    /// applications were submitted.
    pub async fn run(&self, session: &dyn BrowserSession) -> Result<u32, RunnerError> {
        self.login(session).await?;

        // URLs applied to in any prior run; grows in memory as this run
        // applies, so a listing reappearing across pages or queries is
        // processed at most once.
        let mut applied_urls: HashSet<String> = self.ledger.applied_urls()?;
        let mut applied: u32 = 0;

        'queries: for query in self.planner.queries() {
            if applied >= self.config.max_applications_per_run {
                break;
            }

            let search_url = self.spec.search.build(&query.title, &query.location);
            info!(
                platform = self.spec.name,
                title = %query.title,
                location = %query.location,
                "searching"
            );

            if let Err(err) = session.navigate(&search_url, SEARCH_TIMEOUT).await {
                if err.is_fatal() {
                    return Err(err.into());
                }
                warn!(platform = self.spec.name, error = %err, "search page failed to load");
                continue;
            }
            self.pacer.pause(1.5).await;

            for page_index in 0..self.config.result_pages_per_query {
                if applied >= self.config.max_applications_per_run {
                    break 'queries;
                }

                if page_index > 0
                    && !self
                        .advance_to_page(session, &search_url, page_index)
                        .await?
                {
                    break;
                }

                let listings = ListingExtractor::new(self.spec).extract(session).await;
                if listings.is_empty() {
                    break;
                }

                for listing in listings {
                    if applied >= self.config.max_applications_per_run {
                        info!(
                            platform = self.spec.name,
                            cap = self.config.max_applications_per_run,
                            "application cap reached"
                        );
                        break 'queries;
                    }

                    if applied_urls.contains(&listing.url) {
                        debug!(url = %listing.url, "already applied; skipping");
                        continue;
                    }

                    let outcome = self.process_listing(session, &listing).await;

                    if outcome.status == OutcomeStatus::Applied {
                        applied += 1;
                        applied_urls.insert(listing.url.clone());
                        if let Err(err) = self.notifier.notify_single(&outcome) {
                            warn!(error = %err, "single-application notification failed");
                        }
                    }

                    if let Err(err) = self.ledger.record(&outcome) {
                        warn!(error = %err, "failed to record outcome");
                    }
                }
            }
        }

        info!(
            platform = self.spec.name,
            applied, "platform run complete"
        );
        Ok(applied)
    }

    /// Handle a single listing to a terminal outcome. Unexpected errors are
    /// converted into a failed outcome here so one bad listing never aborts
    /// the run.
    async fn process_listing(
        &self,
        session: &dyn BrowserSession,
        listing: &JobListing,
    ) -> ApplicationOutcome {
        info!(
            platform = self.spec.name,
            company = %listing.company,
            title = %listing.title,
            "attempting application"
        );

        let driver = FlowDriver::new(
            self.spec,
            self.book,
            self.resume,
            self.pacer,
            &self.config.flow,
        );

        let result: Result<FlowOutcome, BrowserError> = async {
            session.navigate(&listing.url, LISTING_TIMEOUT).await?;
            self.pacer.pause(1.0).await;
            driver.run(session).await
        }
        .await;

        match result {
            Ok(FlowOutcome::Applied) => {
                info!(
                    platform = self.spec.name,
                    company = %listing.company,
                    title = %listing.title,
                    "application submitted"
                );
                ApplicationOutcome::applied(self.spec.name, listing.clone())
            }
            Ok(FlowOutcome::Skipped { reason }) => {
                debug!(url = %listing.url, %reason, "listing skipped");
                ApplicationOutcome::skipped(self.spec.name, listing.clone(), reason)
            }
            Ok(FlowOutcome::Aborted { reason }) | Ok(FlowOutcome::Failed { reason }) => {
                warn!(url = %listing.url, %reason, "application flow failed");
                ApplicationOutcome::failed(self.spec.name, listing.clone(), reason)
            }
            Err(err) => {
                error!(url = %listing.url, error = %err, "error while processing listing");
                ApplicationOutcome::failed(self.spec.name, listing.clone(), err.to_string())
            }
        }
    }

    /// Return to the search results and click through to `page_index`
    /// pages past the first. `false` means pagination ended.
    async fn advance_to_page(
        &self,
        session: &dyn BrowserSession,
        search_url: &str,
        page_index: u32,
    ) -> Result<bool, RunnerError> {
        if let Err(err) = session.navigate(search_url, SEARCH_TIMEOUT).await {
            if err.is_fatal() {
                return Err(err.into());
            }
            return Ok(false);
        }
        self.pacer.pause(1.0).await;

        for _ in 0..page_index {
            match find_control(session, &self.spec.listing.next_page).await? {
                Some(next) => {
                    session.click(next).await?;
                    self.pacer.pause(1.5).await;
                }
                None => return Ok(false),
            }
        }

        Ok(true)
    }

    async fn login(&self, session: &dyn BrowserSession) -> Result<(), RunnerError> {
        info!(platform = self.spec.name, "logging in");
        let script = &self.spec.login;

        session
            .navigate(script.url, LOGIN_TIMEOUT)
            .await
            .map_err(|err| RunnerError::Auth {
                platform: self.spec.name,
                reason: format!("login page failed to load: {err}"),
            })?;
        self.pacer.pause(1.0).await;

        for step in script.steps {
            match step {
                LoginStep::Fill { selectors, value } => {
                    if let Some(first) = selectors.first() {
                        session.wait_visible(first, LOGIN_FIELD_WAIT).await?;
                    }
                    match session.find_first(selectors).await? {
                        Some(field) => {
                            let credential = match value {
                                CredentialField::Email => &self.credentials.email,
                                CredentialField::Password => &self.credentials.password,
                            };
                            session.fill(field, credential).await?;
                            self.pacer.pause(0.5).await;
                        }
                        None => {
                            // Some platforms collapse steps (e.g. cookie
                            // reuse skips the password screen).
                            warn!(
                                platform = self.spec.name,
                                "login field not found; continuing"
                            );
                        }
                    }
                }
                LoginStep::Click { control } => {
                    if let Some(button) = find_control(session, control).await? {
                        session.click(button).await?;
                    }
                    self.pacer.pause(1.0).await;
                }
            }
        }

        self.verify_login(session).await
    }

    async fn verify_login(&self, session: &dyn BrowserSession) -> Result<(), RunnerError> {
        let script = &self.spec.login;
        let start = std::time::Instant::now();

        loop {
            let url = session.current_url().await?;
            let lower = url.to_lowercase();

            if script
                .challenge_url_markers
                .iter()
                .any(|marker| lower.contains(marker))
            {
                return Err(RunnerError::Challenge {
                    platform: self.spec.name,
                });
            }

            match script.success_url_fragment {
                Some(fragment) if lower.contains(fragment) => {
                    info!(platform = self.spec.name, "login successful");
                    return Ok(());
                }
                None => {
                    info!(platform = self.spec.name, "login steps complete");
                    return Ok(());
                }
                Some(fragment) => {
                    if start.elapsed() >= self.config.login_verify_wait {
                        return Err(RunnerError::Auth {
                            platform: self.spec.name,
                            reason: format!(
                                "expected post-login url containing '{fragment}', got '{url}'"
                            ),
                        });
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
}
