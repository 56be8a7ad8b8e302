//! Shared fixtures: a scripted in-memory browser session, memory-backed
//! collaborators, and a compact platform table the engine tests drive.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::artifact::{ArtifactError, ResumeProvider};
use crate::browser::{BrowserError, BrowserSession, ElementHandle};
use crate::engine::domain::{ApplicationOutcome, CycleStats, OutcomeStatus};
use crate::engine::flow::{FlowConfig, SubmissionPolicy};
use crate::engine::runner::RunnerConfig;
use crate::ledger::{LedgerError, OutcomeLedger};
use crate::notify::{Notifier, NotifyError};
use crate::platforms::{
    ControlMatcher, CredentialField, FlowSelectors, ListingSelectors, LoginScript, LoginStep,
    PlatformSpec, SearchTemplate,
};

const PAGE_STRIDE: i64 = 1000;

/// Compact strategy table exercised by the engine tests. Selector names are
/// deliberately unlike any real platform's.
pub(super) static TEST_PLATFORM: PlatformSpec = PlatformSpec {
    id: "testboard",
    name: "TestBoard",
    origin: "https://jobs.test",
    login: LoginScript {
        url: "https://jobs.test/login",
        steps: &[
            LoginStep::Fill {
                selectors: &["input.email"],
                value: CredentialField::Email,
            },
            LoginStep::Fill {
                selectors: &["input.password"],
                value: CredentialField::Password,
            },
            LoginStep::Click {
                control: ControlMatcher {
                    css: &["button.signin"],
                    text_tags: &[],
                    texts: &[],
                },
            },
        ],
        success_url_fragment: Some("/home"),
        challenge_url_markers: &["/checkpoint"],
    },
    search: SearchTemplate {
        base: "https://jobs.test/search",
        keyword_param: "q",
        location_param: "l",
        fixed_params: &[],
        regional_bases: &[],
    },
    listing: ListingSelectors {
        card_wait: ".card",
        card_cascade: &[".card"],
        title: &[".title", ".title-alt"],
        company: &[".company"],
        location: &[".loc"],
        link: &["a.job"],
        easy_apply_badge: &[".quick"],
        fallback_item: "main li",
        job_link: &["a.job"],
        next_page: ControlMatcher {
            css: &["a.next"],
            text_tags: &[],
            texts: &[],
        },
    },
    flow: FlowSelectors {
        open_apply: ControlMatcher {
            css: &["button.apply"],
            text_tags: &["button"],
            texts: &["quick apply"],
        },
        external_markers: &["company site"],
        confirmation: ControlMatcher {
            css: &[".confirmation"],
            text_tags: &["h2"],
            texts: &["application sent"],
        },
        submit: ControlMatcher {
            css: &["button.submit"],
            text_tags: &[],
            texts: &[],
        },
        review: ControlMatcher {
            css: &["button.review"],
            text_tags: &[],
            texts: &[],
        },
        next: ControlMatcher {
            css: &["button.next"],
            text_tags: &[],
            texts: &[],
        },
        dismiss: ControlMatcher {
            css: &["button.dismiss"],
            text_tags: &[],
            texts: &[],
        },
        text_inputs: &["input.q", "textarea.q"],
        selects: "select.q",
        choice_groups: &["fieldset.q"],
        group_label: &["legend"],
        file_input: "input.file",
    },
    job_url_pattern: r"/jobs/view/(\d+)",
    quick_apply_filtered: false,
};

pub(super) fn test_flow_config() -> FlowConfig {
    FlowConfig {
        step_cap: 6,
        submit_policy: SubmissionPolicy::OptimisticApplied,
        confirmation_wait: Duration::ZERO,
    }
}

pub(super) fn test_runner_config() -> RunnerConfig {
    RunnerConfig {
        max_applications_per_run: 50,
        result_pages_per_query: 1,
        login_verify_wait: Duration::ZERO,
        flow: test_flow_config(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ClickAction {
    None,
    GotoPage(usize),
}

#[derive(Debug, Clone)]
pub(super) struct FakeElement {
    selectors: Vec<String>,
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
    value: String,
    parent: Option<usize>,
    on_click: ClickAction,
    label: String,
}

pub(super) struct ElementBuilder {
    element: FakeElement,
}

pub(super) fn el(tag: &str) -> ElementBuilder {
    ElementBuilder {
        element: FakeElement {
            selectors: Vec::new(),
            tag: tag.to_string(),
            text: String::new(),
            attrs: HashMap::new(),
            value: String::new(),
            parent: None,
            on_click: ClickAction::None,
            label: tag.to_string(),
        },
    }
}

impl ElementBuilder {
    pub(super) fn sel(mut self, selector: &str) -> Self {
        if self.element.selectors.is_empty() {
            self.element.label = selector.to_string();
        }
        self.element.selectors.push(selector.to_string());
        self
    }

    pub(super) fn text(mut self, text: &str) -> Self {
        self.element.text = text.to_string();
        self
    }

    pub(super) fn attr(mut self, name: &str, value: &str) -> Self {
        self.element.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub(super) fn value(mut self, value: &str) -> Self {
        self.element.value = value.to_string();
        self
    }

    pub(super) fn parent(mut self, index: usize) -> Self {
        self.element.parent = Some(index);
        self
    }

    pub(super) fn goto(mut self, page: usize) -> Self {
        self.element.on_click = ClickAction::GotoPage(page);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct FakePage {
    pub(super) url: String,
    elements: Vec<FakeElement>,
    eval_results: Vec<(String, Value)>,
    visible_text: String,
}

impl FakePage {
    pub(super) fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub(super) fn add(&mut self, builder: ElementBuilder) -> usize {
        self.elements.push(builder.element);
        self.elements.len() - 1
    }

    /// Canned result for `evaluate` calls whose script contains `key`.
    pub(super) fn eval_result(&mut self, key: &str, value: Value) {
        self.eval_results.push((key.to_string(), value));
    }

    pub(super) fn visible_text(&mut self, text: &str) {
        self.visible_text = text.to_string();
    }
}

#[derive(Debug, Default)]
struct SessionState {
    current: Option<usize>,
    off_script_url: String,
    values: HashMap<(usize, usize), String>,
    clicks: Vec<String>,
    uploads: Vec<PathBuf>,
    navigations: Vec<String>,
}

/// Scripted [`BrowserSession`]: a fixed set of pages, exact-string selector
/// matching, and click actions that move between pages. Navigating to an
/// unscripted URL lands on an empty page.
pub(super) struct ScriptedSession {
    pages: Vec<FakePage>,
    state: Mutex<SessionState>,
}

impl ScriptedSession {
    pub(super) fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            state: Mutex::new(SessionState {
                current: Some(0),
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session mutex poisoned")
    }

    fn handle(page: usize, index: usize) -> ElementHandle {
        ElementHandle(page as i64 * PAGE_STRIDE + index as i64)
    }

    fn decode(handle: ElementHandle) -> (usize, usize) {
        (
            (handle.0 / PAGE_STRIDE) as usize,
            (handle.0 % PAGE_STRIDE) as usize,
        )
    }

    fn element(&self, handle: ElementHandle) -> Result<(usize, usize, &FakeElement), BrowserError> {
        let (page, index) = Self::decode(handle);
        self.pages
            .get(page)
            .and_then(|p| p.elements.get(index))
            .map(|element| (page, index, element))
            .ok_or_else(|| BrowserError::ElementNotFound(format!("handle {}", handle.0)))
    }

    fn matches(element: &FakeElement, selector: &str) -> bool {
        element.tag == selector || element.selectors.iter().any(|s| s == selector)
    }

    fn descends_from(&self, page: &FakePage, mut index: usize, scope: usize) -> bool {
        while let Some(parent) = page.elements[index].parent {
            if parent == scope {
                return true;
            }
            index = parent;
        }
        false
    }

    fn current_page(&self) -> Option<(usize, &FakePage)> {
        let current = self.lock().current?;
        self.pages.get(current).map(|page| (current, page))
    }

    pub(super) fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    pub(super) fn uploads(&self) -> Vec<PathBuf> {
        self.lock().uploads.clone()
    }

    pub(super) fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// The value written into an element, if any.
    pub(super) fn value_at(&self, page: usize, index: usize) -> Option<String> {
        self.lock().values.get(&(page, index)).cloned()
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        let mut state = self.lock();
        state.navigations.push(url.to_string());
        match self.pages.iter().position(|page| page.url == url) {
            Some(index) => {
                state.current = Some(index);
                state.off_script_url.clear();
            }
            None => {
                state.current = None;
                state.off_script_url = url.to_string();
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let state = self.lock();
        match state.current {
            Some(index) => Ok(self.pages[index].url.clone()),
            None => Ok(state.off_script_url.clone()),
        }
    }

    async fn wait_visible(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, BrowserError> {
        Ok(self
            .current_page()
            .map(|(_, page)| {
                page.elements
                    .iter()
                    .any(|element| Self::matches(element, selector))
            })
            .unwrap_or(false))
    }

    async fn find_first(
        &self,
        selectors: &[&str],
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let Some((page_index, page)) = self.current_page() else {
            return Ok(None);
        };
        for selector in selectors {
            if let Some(index) = page
                .elements
                .iter()
                .position(|element| Self::matches(element, selector))
            {
                return Ok(Some(Self::handle(page_index, index)));
            }
        }
        Ok(None)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let Some((page_index, page)) = self.current_page() else {
            return Ok(Vec::new());
        };
        Ok(page
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| Self::matches(element, selector))
            .map(|(index, _)| Self::handle(page_index, index))
            .collect())
    }

    async fn find_in_first(
        &self,
        scope: ElementHandle,
        selectors: &[&str],
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let (scope_page, scope_index) = Self::decode(scope);
        let Some(page) = self.pages.get(scope_page) else {
            return Ok(None);
        };
        for selector in selectors {
            for (index, element) in page.elements.iter().enumerate() {
                if Self::matches(element, selector)
                    && self.descends_from(page, index, scope_index)
                {
                    return Ok(Some(Self::handle(scope_page, index)));
                }
            }
        }
        Ok(None)
    }

    async fn find_in_all(
        &self,
        scope: ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        let (scope_page, scope_index) = Self::decode(scope);
        let Some(page) = self.pages.get(scope_page) else {
            return Ok(Vec::new());
        };
        Ok(page
            .elements
            .iter()
            .enumerate()
            .filter(|(index, element)| {
                Self::matches(element, selector)
                    && self.descends_from(page, *index, scope_index)
            })
            .map(|(index, _)| Self::handle(scope_page, index))
            .collect())
    }

    async fn text(&self, element: ElementHandle) -> Result<String, BrowserError> {
        let (_, _, fake) = self.element(element)?;
        Ok(fake.text.clone())
    }

    async fn attr(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let (_, _, fake) = self.element(element)?;
        Ok(fake.attrs.get(name).cloned())
    }

    async fn input_value(&self, element: ElementHandle) -> Result<String, BrowserError> {
        let (page, index, fake) = self.element(element)?;
        let state = self.lock();
        Ok(state
            .values
            .get(&(page, index))
            .cloned()
            .unwrap_or_else(|| fake.value.clone()))
    }

    async fn fill(&self, element: ElementHandle, text: &str) -> Result<(), BrowserError> {
        let (page, index, _) = self.element(element)?;
        self.lock().values.insert((page, index), text.to_string());
        Ok(())
    }

    async fn click(&self, element: ElementHandle) -> Result<(), BrowserError> {
        let (_, _, fake) = self.element(element)?;
        let action = fake.on_click;
        let label = fake.label.clone();
        let mut state = self.lock();
        state.clicks.push(label);
        if let ClickAction::GotoPage(page) = action {
            state.current = Some(page);
            state.off_script_url.clear();
        }
        Ok(())
    }

    async fn select_option(
        &self,
        element: ElementHandle,
        label: &str,
    ) -> Result<bool, BrowserError> {
        let (page, index, _) = self.element(element)?;
        self.lock().values.insert((page, index), label.to_string());
        Ok(true)
    }

    async fn upload_file(
        &self,
        element: ElementHandle,
        path: &Path,
    ) -> Result<(), BrowserError> {
        self.element(element)?;
        self.lock().uploads.push(path.to_path_buf());
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        let Some((_, page)) = self.current_page() else {
            return Ok(Value::Null);
        };
        for (key, value) in &page.eval_results {
            if script.contains(key.as_str()) {
                return Ok(value.clone());
            }
        }
        Ok(Value::Null)
    }

    async fn visible_text(&self) -> Result<String, BrowserError> {
        Ok(self
            .current_page()
            .map(|(_, page)| page.visible_text.clone())
            .unwrap_or_default())
    }
}

/// Ledger fake: a seedable applied set plus recorded outcomes.
#[derive(Default, Clone)]
pub(super) struct MemoryLedger {
    seed: Arc<Mutex<HashSet<String>>>,
    records: Arc<Mutex<Vec<ApplicationOutcome>>>,
}

impl MemoryLedger {
    pub(super) fn with_applied(urls: &[&str]) -> Self {
        let ledger = Self::default();
        {
            let mut seed = ledger.seed.lock().expect("ledger mutex poisoned");
            for url in urls {
                seed.insert(url.to_string());
            }
        }
        ledger
    }

    pub(super) fn records(&self) -> Vec<ApplicationOutcome> {
        self.records.lock().expect("ledger mutex poisoned").clone()
    }
}

impl OutcomeLedger for MemoryLedger {
    fn applied_urls(&self) -> Result<HashSet<String>, LedgerError> {
        let mut urls = self.seed.lock().expect("ledger mutex poisoned").clone();
        for record in self.records.lock().expect("ledger mutex poisoned").iter() {
            if record.status == OutcomeStatus::Applied {
                urls.insert(record.listing.url.clone());
            }
        }
        Ok(urls)
    }

    fn record(&self, outcome: &ApplicationOutcome) -> Result<(), LedgerError> {
        self.records
            .lock()
            .expect("ledger mutex poisoned")
            .push(outcome.clone());
        Ok(())
    }

    fn cycle_stats(&self, date: chrono::NaiveDate) -> Result<CycleStats, LedgerError> {
        let mut stats = CycleStats {
            date,
            applied: 0,
            skipped: 0,
            failed: 0,
            companies: Vec::new(),
        };
        for record in self.records.lock().expect("ledger mutex poisoned").iter() {
            if record.timestamp_utc.date_naive() != date {
                continue;
            }
            match record.status {
                OutcomeStatus::Applied => {
                    stats.applied += 1;
                    stats
                        .companies
                        .push(format!("{} - {}", record.listing.company, record.listing.title));
                }
                OutcomeStatus::Skipped => stats.skipped += 1,
                OutcomeStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    singles: Arc<Mutex<Vec<String>>>,
    summaries: Arc<Mutex<Vec<CycleStats>>>,
}

impl MemoryNotifier {
    pub(super) fn singles(&self) -> Vec<String> {
        self.singles.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn summaries(&self) -> Vec<CycleStats> {
        self.summaries
            .lock()
            .expect("notifier mutex poisoned")
            .clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify_single(&self, outcome: &ApplicationOutcome) -> Result<(), NotifyError> {
        self.singles
            .lock()
            .expect("notifier mutex poisoned")
            .push(outcome.listing.url.clone());
        Ok(())
    }

    fn notify_cycle_summary(&self, stats: &CycleStats) -> Result<(), NotifyError> {
        self.summaries
            .lock()
            .expect("notifier mutex poisoned")
            .push(stats.clone());
        Ok(())
    }
}

/// Resume provider that always resolves to a fixed path.
pub(super) struct StaticResume(pub(super) PathBuf);

#[async_trait]
impl ResumeProvider for StaticResume {
    async fn ensure_available(&self) -> Result<PathBuf, ArtifactError> {
        Ok(self.0.clone())
    }
}
