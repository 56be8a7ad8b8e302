//! Browser capability layer.
//!
//! The engine only ever talks to [`BrowserSession`]; the production
//! implementation in [`cdp`] drives a Chrome instance over the DevTools
//! protocol, and tests inject scripted fakes.

pub mod cdp;

pub use cdp::CdpBrowser;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Opaque handle to a DOM node owned by the live page. Handles become stale
/// after navigation; the engine re-queries rather than caching them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub i64);

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("browser endpoint not available at {0}")]
    Unavailable(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("websocket error: {0}")]
    WebSocket(String),
    #[error("protocol error: {message} (code {code})")]
    Protocol { code: i64, message: String },
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("session closed")]
    SessionClosed,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl BrowserError {
    /// Whether the session itself is unusable, as opposed to a transient
    /// miss (absent element, slow page) the engine may absorb.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BrowserError::Unavailable(_)
                | BrowserError::Connection(_)
                | BrowserError::WebSocket(_)
                | BrowserError::SessionClosed
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BrowserError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        BrowserError::WebSocket(err.to_string())
    }
}

/// One live page, driven synchronously from the worker's point of view:
/// every call blocks until it completes or its timeout elapses.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Wait for the selector to match something, up to `timeout`. A miss is
    /// reported as `Ok(false)`, never as an error.
    async fn wait_visible(&self, selector: &str, timeout: Duration) -> Result<bool, BrowserError>;

    /// Try each candidate selector in order; first hit wins.
    async fn find_first(&self, selectors: &[&str])
        -> Result<Option<ElementHandle>, BrowserError>;

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError>;

    /// Scoped variant of [`find_first`](Self::find_first): only matches
    /// descendants of `scope`.
    async fn find_in_first(
        &self,
        scope: ElementHandle,
        selectors: &[&str],
    ) -> Result<Option<ElementHandle>, BrowserError>;

    async fn find_in_all(
        &self,
        scope: ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError>;

    async fn text(&self, element: ElementHandle) -> Result<String, BrowserError>;

    async fn attr(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    async fn input_value(&self, element: ElementHandle) -> Result<String, BrowserError>;

    async fn fill(&self, element: ElementHandle, text: &str) -> Result<(), BrowserError>;

    async fn click(&self, element: ElementHandle) -> Result<(), BrowserError>;

    /// Choose a `<select>` option by visible label, falling back to value
    /// and then to a contains match. Returns whether an option was chosen.
    async fn select_option(
        &self,
        element: ElementHandle,
        label: &str,
    ) -> Result<bool, BrowserError>;

    async fn upload_file(&self, element: ElementHandle, path: &Path)
        -> Result<(), BrowserError>;

    /// Evaluate a script in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// The page's visible text, used for diagnostics when extraction finds
    /// nothing.
    async fn visible_text(&self) -> Result<String, BrowserError>;
}
