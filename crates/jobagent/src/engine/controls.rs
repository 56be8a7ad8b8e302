//! Shared control location over [`ControlMatcher`] tables.

use crate::browser::{BrowserError, BrowserSession, ElementHandle};
use crate::platforms::ControlMatcher;

/// Upper bound on elements inspected per tag during a text scan.
const TEXT_SCAN_LIMIT: usize = 60;

/// Locate a control: CSS candidates first, then a bounded text scan. An
/// absent control is `Ok(None)`; only session-level failures are errors.
pub(crate) async fn find_control(
    session: &dyn BrowserSession,
    matcher: &ControlMatcher,
) -> Result<Option<ElementHandle>, BrowserError> {
    if !matcher.css.is_empty() {
        if let Some(element) = session.find_first(matcher.css).await? {
            return Ok(Some(element));
        }
    }

    if matcher.texts.is_empty() {
        return Ok(None);
    }

    for tag in matcher.text_tags {
        for element in session.find_all(tag).await?.into_iter().take(TEXT_SCAN_LIMIT) {
            let text = match session.text(element).await {
                Ok(text) => text,
                Err(err) if err.is_fatal() => return Err(err),
                Err(_) => continue,
            };
            if text_matches(&text, matcher.texts) {
                return Ok(Some(element));
            }
        }
    }

    Ok(None)
}

pub(crate) fn text_matches(text: &str, needles: &[&str]) -> bool {
    let lower = text.to_lowercase();
    needles.iter().any(|needle| lower.contains(needle))
}
