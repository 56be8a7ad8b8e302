//! Filling visible form fields from the answer book.
//!
//! Covers text inputs, select dropdowns, and radio/checkbox groups. Fields
//! with no resolvable answer are left untouched: the engine never guesses.

use tracing::debug;

use super::controls::text_matches;
use super::pacing::Pacer;
use crate::browser::{BrowserError, BrowserSession, ElementHandle};
use crate::platforms::FlowSelectors;
use crate::profile::AnswerBook;

pub(crate) struct FormFiller<'a> {
    flow: &'a FlowSelectors,
    book: &'a AnswerBook,
    pacer: &'a dyn Pacer,
}

impl<'a> FormFiller<'a> {
    pub(crate) fn new(flow: &'a FlowSelectors, book: &'a AnswerBook, pacer: &'a dyn Pacer) -> Self {
        Self { flow, book, pacer }
    }

    /// Fill every currently visible unfilled field that the answer book can
    /// resolve. Returns how many fields were written.
    pub(crate) async fn fill_visible_fields(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<u32, BrowserError> {
        let mut filled = 0;
        filled += self.fill_text_inputs(session).await?;
        filled += self.fill_selects(session).await?;
        filled += self.fill_choice_groups(session).await?;
        if filled > 0 {
            debug!(filled, "filled form fields");
        }
        Ok(filled)
    }

    async fn fill_text_inputs(&self, session: &dyn BrowserSession) -> Result<u32, BrowserError> {
        let mut filled = 0;
        for selector in self.flow.text_inputs {
            for input in session.find_all(selector).await? {
                match self.fill_one_input(session, input).await {
                    Ok(true) => filled += 1,
                    Ok(false) => {}
                    Err(err) if err.is_fatal() => return Err(err),
                    // One unreadable field never blocks the rest.
                    Err(_) => {}
                }
            }
        }
        Ok(filled)
    }

    async fn fill_one_input(
        &self,
        session: &dyn BrowserSession,
        input: ElementHandle,
    ) -> Result<bool, BrowserError> {
        let current = session.input_value(input).await?;
        if !current.trim().is_empty() {
            return Ok(false);
        }

        let Some(label) = self.field_label(session, input).await? else {
            return Ok(false);
        };
        let Some(answer) = self.book.resolve(&label) else {
            return Ok(false);
        };
        if answer.is_empty() {
            return Ok(false);
        }

        session.fill(input, answer).await?;
        self.pacer.pause(0.2).await;
        Ok(true)
    }

    async fn fill_selects(&self, session: &dyn BrowserSession) -> Result<u32, BrowserError> {
        let mut filled = 0;
        for select in session.find_all(self.flow.selects).await? {
            let outcome: Result<bool, BrowserError> = async {
                let Some(label) = self.field_label(session, select).await? else {
                    return Ok(false);
                };
                let Some(answer) = self.book.resolve(&label) else {
                    return Ok(false);
                };
                if answer.is_empty() {
                    return Ok(false);
                }
                let chosen = session.select_option(select, answer).await?;
                if chosen {
                    self.pacer.pause(0.2).await;
                }
                Ok(chosen)
            }
            .await;

            match outcome {
                Ok(true) => filled += 1,
                Ok(false) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(_) => {}
            }
        }
        Ok(filled)
    }

    async fn fill_choice_groups(&self, session: &dyn BrowserSession) -> Result<u32, BrowserError> {
        let mut filled = 0;
        for selector in self.flow.choice_groups {
            for group in session.find_all(selector).await? {
                match self.fill_one_group(session, group).await {
                    Ok(true) => filled += 1,
                    Ok(false) => {}
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(_) => {}
                }
            }
        }
        Ok(filled)
    }

    async fn fill_one_group(
        &self,
        session: &dyn BrowserSession,
        group: ElementHandle,
    ) -> Result<bool, BrowserError> {
        let legend = match session.find_in_first(group, self.flow.group_label).await? {
            Some(element) => session.text(element).await?,
            None => return Ok(false),
        };
        let legend = legend.trim();
        if legend.is_empty() {
            return Ok(false);
        }

        let Some(answer) = self.book.resolve(legend) else {
            return Ok(false);
        };
        if answer.is_empty() {
            return Ok(false);
        }

        let needle = answer.to_lowercase();
        for option in session.find_in_all(group, "label").await? {
            let text = session.text(option).await?;
            if text_matches(&text, &[needle.as_str()]) {
                session.click(option).await?;
                self.pacer.pause(0.2).await;
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Resolve the human label for a form element: `label[for=id]` first,
    /// then aria-label, then placeholder.
    async fn field_label(
        &self,
        session: &dyn BrowserSession,
        element: ElementHandle,
    ) -> Result<Option<String>, BrowserError> {
        if let Some(id) = session.attr(element, "id").await? {
            if !id.is_empty() {
                let selector = format!("label[for='{id}']");
                if let Some(label) = session.find_first(&[selector.as_str()]).await? {
                    let text = session.text(label).await?;
                    if !text.trim().is_empty() {
                        return Ok(Some(text));
                    }
                }
            }
        }

        if let Some(aria) = session.attr(element, "aria-label").await? {
            if !aria.trim().is_empty() {
                return Ok(Some(aria));
            }
        }

        if let Some(placeholder) = session.attr(element, "placeholder").await? {
            if !placeholder.trim().is_empty() {
                return Ok(Some(placeholder));
            }
        }

        Ok(None)
    }
}
