//! Listing extraction over unstable, platform-controlled markup.
//!
//! Strategies are tried in order and the first one that yields a
//! structurally valid card wins: structural card selectors, then a
//! script-evaluated scan of job-view hyperlinks, then any list item in the
//! main content region that carries a job link. Total failure is a normal
//! "no results" outcome, not an error.

use std::collections::HashSet;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::domain::JobListing;
use crate::browser::{BrowserError, BrowserSession, ElementHandle};
use crate::platforms::PlatformSpec;

const CARD_WAIT: Duration = Duration::from_secs(10);
const DIAGNOSTIC_TEXT_LIMIT: usize = 600;

pub struct ListingExtractor<'a> {
    spec: &'a PlatformSpec,
    job_id_regex: Option<Regex>,
}

/// Shape returned by the link-scan script.
#[derive(Debug, Deserialize)]
struct ScrapedCard {
    #[serde(default)]
    title: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    href: String,
}

impl<'a> ListingExtractor<'a> {
    pub fn new(spec: &'a PlatformSpec) -> Self {
        let job_id_regex = Regex::new(spec.job_url_pattern).ok();
        Self { spec, job_id_regex }
    }

    /// Extract all listings from the current page. Never fails: extraction
    /// problems are logged and an empty sequence is returned.
    pub async fn extract(&self, session: &dyn BrowserSession) -> Vec<JobListing> {
        match self.run_cascade(session).await {
            Ok(listings) if !listings.is_empty() => {
                debug!(
                    platform = self.spec.name,
                    count = listings.len(),
                    "extracted listings"
                );
                listings
            }
            Ok(_) => {
                self.report_empty_page(session).await;
                Vec::new()
            }
            Err(err) => {
                warn!(
                    platform = self.spec.name,
                    error = %err,
                    "listing extraction failed"
                );
                Vec::new()
            }
        }
    }

    async fn run_cascade(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<Vec<JobListing>, BrowserError> {
        // Give the results list a moment to render; a miss is not fatal,
        // the fallback strategies may still find links.
        session
            .wait_visible(self.spec.listing.card_wait, CARD_WAIT)
            .await?;

        let listings = self.structural_cards(session).await?;
        if !listings.is_empty() {
            return Ok(listings);
        }

        let listings = self.link_scan(session).await?;
        if !listings.is_empty() {
            debug!(platform = self.spec.name, "fell back to link scan");
            return Ok(listings);
        }

        let listings = self.fallback_items(session).await?;
        if !listings.is_empty() {
            debug!(platform = self.spec.name, "fell back to list items");
        }
        Ok(listings)
    }

    /// Strategy 1: known card selectors, most specific first.
    async fn structural_cards(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<Vec<JobListing>, BrowserError> {
        for selector in self.spec.listing.card_cascade {
            let cards = session.find_all(selector).await?;
            if cards.is_empty() {
                continue;
            }

            let mut listings = Vec::new();
            for card in cards {
                match self.parse_card(session, card).await {
                    Ok(Some(listing)) => listings.push(listing),
                    Ok(None) => {}
                    Err(err) if err.is_fatal() => return Err(err),
                    // A single unreadable card is dropped silently.
                    Err(_) => {}
                }
            }

            if !listings.is_empty() {
                return Ok(listings);
            }
        }

        Ok(Vec::new())
    }

    async fn parse_card(
        &self,
        session: &dyn BrowserSession,
        card: ElementHandle,
    ) -> Result<Option<JobListing>, BrowserError> {
        let title = self
            .first_text(session, card, self.spec.listing.title)
            .await?;

        let link = session
            .find_in_first(card, self.spec.listing.link)
            .await?;
        let href = match link {
            Some(link) => session.attr(link, "href").await?.unwrap_or_default(),
            None => String::new(),
        };

        // No title and no link means this is not a job card.
        if title.is_empty() && href.is_empty() {
            return Ok(None);
        }

        let company = self
            .first_text(session, card, self.spec.listing.company)
            .await?;
        let location = self
            .first_text(session, card, self.spec.listing.location)
            .await?;

        let url = absolutize(self.spec.origin, &href);
        let easy_apply = self.spec.quick_apply_filtered
            || session
                .find_in_first(card, self.spec.listing.easy_apply_badge)
                .await?
                .is_some();

        Ok(Some(JobListing {
            title,
            company,
            location,
            platform_job_id: self.job_id(&url),
            url,
            easy_apply,
        }))
    }

    /// Per-field secondary cascade: first selector with non-empty trimmed
    /// text wins.
    async fn first_text(
        &self,
        session: &dyn BrowserSession,
        card: ElementHandle,
        selectors: &[&str],
    ) -> Result<String, BrowserError> {
        for &selector in selectors {
            if let Some(element) = session.find_in_first(card, &[selector]).await? {
                let text = session.text(element).await?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Ok(trimmed.to_string());
                }
            }
        }
        Ok(String::new())
    }

    /// Strategy 2: scan every hyperlink matching the platform's job-view
    /// URL pattern, deduplicate by embedded job id, and reconstruct a card
    /// from the nearest containing block. Company and location are guessed
    /// from the first short text spans that are not the title.
    async fn link_scan(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<Vec<JobListing>, BrowserError> {
        let script = link_scan_script(self.spec.job_url_pattern);
        let value = session.evaluate(&script).await?;
        let cards: Vec<ScrapedCard> = serde_json::from_value(value).unwrap_or_default();

        let mut seen = HashSet::new();
        let mut listings = Vec::new();
        for card in cards {
            if card.title.is_empty() && card.href.is_empty() {
                continue;
            }
            let url = absolutize(self.spec.origin, &card.href);
            // Keyed by the embedded job id; the same job can surface under
            // several URLs that differ only in tracking parameters.
            let job_id = self.job_id(&url);
            let key = if job_id.is_empty() {
                url.clone()
            } else {
                job_id.clone()
            };
            if !seen.insert(key) {
                continue;
            }
            listings.push(JobListing {
                title: card.title,
                company: card.company,
                location: card.location,
                platform_job_id: job_id,
                url,
                easy_apply: self.spec.quick_apply_filtered,
            });
        }

        Ok(listings)
    }

    /// Strategy 3: any list item in the main content region containing a
    /// job-view hyperlink.
    async fn fallback_items(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<Vec<JobListing>, BrowserError> {
        let items = session.find_all(self.spec.listing.fallback_item).await?;
        let mut seen = HashSet::new();
        let mut listings = Vec::new();

        for item in items {
            let link = match session
                .find_in_first(item, self.spec.listing.job_link)
                .await
            {
                Ok(Some(link)) => link,
                Ok(None) => continue,
                Err(err) if err.is_fatal() => return Err(err),
                Err(_) => continue,
            };

            let href = session.attr(link, "href").await?.unwrap_or_default();
            if href.is_empty() {
                continue;
            }
            let url = absolutize(self.spec.origin, &href);
            if !seen.insert(url.clone()) {
                continue;
            }

            let title = session.text(link).await?.trim().to_string();
            let company = self
                .first_text(session, item, self.spec.listing.company)
                .await?;
            let location = self
                .first_text(session, item, self.spec.listing.location)
                .await?;

            listings.push(JobListing {
                title,
                company,
                location,
                platform_job_id: self.job_id(&url),
                url,
                easy_apply: self.spec.quick_apply_filtered,
            });
        }

        Ok(listings)
    }

    async fn report_empty_page(&self, session: &dyn BrowserSession) {
        match session.visible_text().await {
            Ok(text) => {
                let snippet: String = text.chars().take(DIAGNOSTIC_TEXT_LIMIT).collect();
                warn!(
                    platform = self.spec.name,
                    page_text = %snippet,
                    "no listings matched any extraction strategy"
                );
            }
            Err(err) => {
                warn!(
                    platform = self.spec.name,
                    error = %err,
                    "no listings matched and page text was unavailable"
                );
            }
        }
    }

    fn job_id(&self, url: &str) -> String {
        self.job_id_regex
            .as_ref()
            .and_then(|regex| regex.captures(url))
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }
}

fn absolutize(origin: &str, href: &str) -> String {
    if href.is_empty() || href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        href.trim_start_matches('/')
    )
}

fn link_scan_script(job_url_pattern: &str) -> String {
    format!(
        r#"(() => {{
            const pattern = new RegExp({job_url_pattern:?});
            const seen = new Set();
            const out = [];
            for (const anchor of document.querySelectorAll('a[href]')) {{
                const match = anchor.href.match(pattern);
                if (!match || seen.has(match[1])) continue;
                seen.add(match[1]);
                const card = anchor.closest('li, article, div') || anchor;
                const title = (anchor.innerText || '').trim().split('\n')[0];
                let company = '';
                let location = '';
                for (const node of card.querySelectorAll('*')) {{
                    const text = (node.innerText || '').trim();
                    if (!text || text === title) continue;
                    if (text.length > 60 || text.includes('\n')) continue;
                    if (!company) {{ company = text; continue; }}
                    if (text !== company) {{ location = text; break; }}
                }}
                out.push({{ title, company, location, href: anchor.href }});
            }}
            return out;
        }})()"#
    )
}
