//! Engine data model: listings, outcomes, and cycle statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters kept from a failure reason before it is persisted.
pub const FAILURE_REASON_LIMIT: usize = 200;

/// One job listing scraped from a search results page. The canonical `url`
/// is the listing's identity: two listings with the same URL are the same
/// job regardless of scraped text differences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    /// Platform job id parsed from the URL, diagnostics only.
    pub platform_job_id: String,
    pub easy_apply: bool,
}

/// Terminal status of one processed listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Applied,
    Skipped,
    Failed,
}

impl OutcomeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Applied => "applied",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Failed => "failed",
        }
    }
}

/// Immutable record of how one listing was handled. Created exactly once
/// per processed listing and handed to the ledger as-is.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationOutcome {
    pub status: OutcomeStatus,
    pub failure_reason: Option<String>,
    pub timestamp_utc: DateTime<Utc>,
    pub platform: String,
    pub listing: JobListing,
    pub easy_apply: bool,
}

impl ApplicationOutcome {
    pub fn applied(platform: &str, listing: JobListing) -> Self {
        let easy_apply = listing.easy_apply;
        Self {
            status: OutcomeStatus::Applied,
            failure_reason: None,
            timestamp_utc: Utc::now(),
            platform: platform.to_string(),
            listing,
            easy_apply,
        }
    }

    pub fn skipped(platform: &str, listing: JobListing, reason: impl Into<String>) -> Self {
        let easy_apply = listing.easy_apply;
        Self {
            status: OutcomeStatus::Skipped,
            failure_reason: Some(truncate_reason(&reason.into())),
            timestamp_utc: Utc::now(),
            platform: platform.to_string(),
            listing,
            easy_apply,
        }
    }

    pub fn failed(platform: &str, listing: JobListing, reason: impl Into<String>) -> Self {
        let easy_apply = listing.easy_apply;
        Self {
            status: OutcomeStatus::Failed,
            failure_reason: Some(truncate_reason(&reason.into())),
            timestamp_utc: Utc::now(),
            platform: platform.to_string(),
            listing,
            easy_apply,
        }
    }
}

/// Per-day totals summarized from the ledger for the cycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStats {
    pub date: NaiveDate,
    pub applied: u32,
    pub skipped: u32,
    pub failed: u32,
    /// "Company - Title" lines for applications submitted on `date`.
    pub companies: Vec<String>,
}

pub fn truncate_reason(reason: &str) -> String {
    if reason.chars().count() <= FAILURE_REASON_LIMIT {
        return reason.to_string();
    }
    let mut truncated: String = reason.chars().take(FAILURE_REASON_LIMIT - 3).collect();
    truncated.push_str("...");
    truncated
}
