use std::sync::Arc;
use std::time::Duration;

use jobagent::artifact::LocalResumeProvider;
use jobagent::config::AppConfig;
use jobagent::engine::flow::FlowConfig;
use jobagent::engine::{CycleOrchestrator, HumanPacer, PlatformRegistration, QueryPlanner, RunnerConfig};
use jobagent::ledger::CsvLedger;
use jobagent::notify::LogNotifier;
use jobagent::platforms;
use jobagent::profile::AnswerBook;

/// Which platforms this invocation should drive.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlatformFilter {
    pub(crate) linkedin: bool,
    pub(crate) indeed: bool,
}

impl PlatformFilter {
    pub(crate) fn from_flags(linkedin_only: bool, indeed_only: bool) -> Self {
        Self {
            linkedin: !indeed_only,
            indeed: !linkedin_only,
        }
    }
}

/// Wire the production collaborators into a cycle orchestrator.
pub(crate) fn build_orchestrator(config: &AppConfig, filter: PlatformFilter) -> CycleOrchestrator {
    let mut registrations = Vec::new();
    if filter.linkedin {
        registrations.push(PlatformRegistration {
            spec: &platforms::LINKEDIN,
            credentials: config.credentials.linkedin.clone(),
        });
    }
    if filter.indeed {
        registrations.push(PlatformRegistration {
            spec: &platforms::INDEED,
            credentials: config.credentials.indeed.clone(),
        });
    }

    let planner = QueryPlanner::new(config.search.titles.clone(), config.search.locations.clone());
    let book = AnswerBook::with_default_table(&config.applicant);
    let ledger = CsvLedger::new(config.ledger.applications_csv.clone());
    let resume = LocalResumeProvider::new(
        config.artifacts.resume_path.clone(),
        config.artifacts.resume_url.clone(),
    );
    let pacer = HumanPacer::new(config.engine.action_delay);

    let runner_config = RunnerConfig {
        max_applications_per_run: config.engine.max_applications_per_run,
        result_pages_per_query: config.engine.result_pages_per_query,
        login_verify_wait: Duration::from_secs(15),
        flow: FlowConfig {
            step_cap: config.engine.step_cap,
            submit_policy: config.engine.submit_policy,
            confirmation_wait: Duration::from_secs(8),
        },
    };

    CycleOrchestrator::new(
        registrations,
        planner,
        book,
        Arc::new(ledger),
        Arc::new(LogNotifier),
        Arc::new(resume),
        Arc::new(pacer),
        runner_config,
    )
}
