//! A stub browser session for integration tests, built purely against the
//! public capability trait. Selector matching is by exact string, and click
//! actions move between scripted pages.

// Each integration test crate compiles this module separately and uses a
// different subset of it.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use jobagent::browser::{BrowserError, BrowserSession, ElementHandle};
use serde_json::Value;

const PAGE_STRIDE: i64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct StubElement {
    pub selectors: Vec<String>,
    pub tag: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub parent: Option<usize>,
    pub goto: Option<usize>,
}

impl StubElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn sel(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn parent(mut self, index: usize) -> Self {
        self.parent = Some(index);
        self
    }

    pub fn goto(mut self, page: usize) -> Self {
        self.goto = Some(page);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct StubPage {
    pub url: String,
    pub elements: Vec<StubElement>,
}

impl StubPage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn add(&mut self, element: StubElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }
}

#[derive(Debug, Default)]
struct StubState {
    current: usize,
    values: HashMap<(usize, usize), String>,
    uploads: Vec<PathBuf>,
}

pub struct StubSession {
    pages: Vec<StubPage>,
    state: Mutex<StubState>,
}

impl StubSession {
    pub fn new(pages: Vec<StubPage>) -> Self {
        Self {
            pages,
            state: Mutex::new(StubState::default()),
        }
    }

    pub fn uploads(&self) -> Vec<PathBuf> {
        self.state.lock().expect("stub mutex poisoned").uploads.clone()
    }

    pub fn value_at(&self, page: usize, index: usize) -> Option<String> {
        self.state
            .lock()
            .expect("stub mutex poisoned")
            .values
            .get(&(page, index))
            .cloned()
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

    fn matches(element: &StubElement, selector: &str) -> bool {
        element.tag == selector || element.selectors.iter().any(|s| s == selector)
    }

    fn current(&self) -> usize {
        self.state.lock().expect("stub mutex poisoned").current
    }

    fn element(&self, handle: ElementHandle) -> Result<&StubElement, BrowserError> {
        let (page, index) = Self::decode(handle);
        self.pages
            .get(page)
            .and_then(|p| p.elements.get(index))
            .ok_or_else(|| BrowserError::ElementNotFound(format!("handle {}", handle.0)))
    }

    fn descends_from(page: &StubPage, mut index: usize, scope: usize) -> bool {
        while let Some(parent) = page.elements[index].parent {
            if parent == scope {
                return true;
            }
            index = parent;
        }
        false
    }
}

#[async_trait]
impl BrowserSession for StubSession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        let mut state = self.state.lock().expect("stub mutex poisoned");
        if let Some(index) = self.pages.iter().position(|page| page.url == url) {
            state.current = index;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.pages[self.current()].url.clone())
    }

    async fn wait_visible(&self, selector: &str, _timeout: Duration) -> Result<bool, BrowserError> {
        let page = &self.pages[self.current()];
        Ok(page
            .elements
            .iter()
            .any(|element| Self::matches(element, selector)))
    }

    async fn find_first(&self, selectors: &[&str]) -> Result<Option<ElementHandle>, BrowserError> {
        let current = self.current();
        let page = &self.pages[current];
        for selector in selectors {
            if let Some(index) = page
                .elements
                .iter()
                .position(|element| Self::matches(element, selector))
            {
                return Ok(Some(Self::handle(current, index)));
            }
        }
        Ok(None)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let current = self.current();
        Ok(self.pages[current]
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| Self::matches(element, selector))
            .map(|(index, _)| Self::handle(current, index))
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
                    && Self::descends_from(page, index, scope_index)
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
                Self::matches(element, selector) && Self::descends_from(page, *index, scope_index)
            })
            .map(|(index, _)| Self::handle(scope_page, index))
            .collect())
    }

    async fn text(&self, element: ElementHandle) -> Result<String, BrowserError> {
        Ok(self.element(element)?.text.clone())
    }

    async fn attr(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        Ok(self.element(element)?.attrs.get(name).cloned())
    }

    async fn input_value(&self, element: ElementHandle) -> Result<String, BrowserError> {
        let (page, index) = Self::decode(element);
        Ok(self
            .state
            .lock()
            .expect("stub mutex poisoned")
            .values
            .get(&(page, index))
            .cloned()
            .unwrap_or_default())
    }

    async fn fill(&self, element: ElementHandle, text: &str) -> Result<(), BrowserError> {
        let (page, index) = Self::decode(element);
        self.state
            .lock()
            .expect("stub mutex poisoned")
            .values
            .insert((page, index), text.to_string());
        Ok(())
    }

    async fn click(&self, element: ElementHandle) -> Result<(), BrowserError> {
        let target = self.element(element)?.goto;
        if let Some(page) = target {
            self.state.lock().expect("stub mutex poisoned").current = page;
        }
        Ok(())
    }

    async fn select_option(
        &self,
        element: ElementHandle,
        label: &str,
    ) -> Result<bool, BrowserError> {
        let (page, index) = Self::decode(element);
        self.state
            .lock()
            .expect("stub mutex poisoned")
            .values
            .insert((page, index), label.to_string());
        Ok(true)
    }

    async fn upload_file(&self, element: ElementHandle, path: &Path) -> Result<(), BrowserError> {
        self.element(element)?;
        self.state
            .lock()
            .expect("stub mutex poisoned")
            .uploads
            .push(path.to_path_buf());
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> Result<Value, BrowserError> {
        Ok(Value::Null)
    }

    async fn visible_text(&self) -> Result<String, BrowserError> {
        Ok(String::new())
    }
}
