//! Append-only outcome ledger.
//!
//! One CSV row per processed listing. The dedup logic reads back only rows
//! with `status = applied`; everything else is bookkeeping for the daily
//! summary.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::engine::domain::{ApplicationOutcome, CycleStats};

pub const CSV_HEADERS: [&str; 9] = [
    "timestamp",
    "platform",
    "job_title",
    "company",
    "location",
    "job_url",
    "status",
    "failure_reason",
    "easy_apply",
];

/// Storage abstraction so the engine can be exercised in isolation.
pub trait OutcomeLedger: Send + Sync {
    /// URLs of every application recorded as applied, across all runs.
    fn applied_urls(&self) -> Result<HashSet<String>, LedgerError>;

    fn record(&self, outcome: &ApplicationOutcome) -> Result<(), LedgerError>;

    /// Totals for one UTC day, for the summary notification.
    fn cycle_stats(&self, date: NaiveDate) -> Result<CycleStats, LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct LedgerRow {
    timestamp: String,
    #[allow(dead_code)]
    platform: String,
    job_title: String,
    company: String,
    #[allow(dead_code)]
    location: String,
    job_url: String,
    status: String,
    #[allow(dead_code)]
    failure_reason: String,
    #[allow(dead_code)]
    easy_apply: String,
}

/// CSV-file ledger, one append per outcome.
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_file(&self) -> Result<(), LedgerError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(CSV_HEADERS)?;
        writer.flush()?;
        Ok(())
    }

    fn read_rows(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        self.ensure_file()?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize::<LedgerRow>() {
            rows.push(row?);
        }
        Ok(rows)
    }
}

impl OutcomeLedger for CsvLedger {
    fn applied_urls(&self) -> Result<HashSet<String>, LedgerError> {
        let mut urls = HashSet::new();
        for row in self.read_rows()? {
            if row.status == "applied" && !row.job_url.is_empty() {
                urls.insert(row.job_url);
            }
        }
        Ok(urls)
    }

    fn record(&self, outcome: &ApplicationOutcome) -> Result<(), LedgerError> {
        self.ensure_file()?;
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([
            outcome.timestamp_utc.to_rfc3339().as_str(),
            outcome.platform.as_str(),
            outcome.listing.title.as_str(),
            outcome.listing.company.as_str(),
            outcome.listing.location.as_str(),
            outcome.listing.url.as_str(),
            outcome.status.label(),
            outcome.failure_reason.as_deref().unwrap_or(""),
            if outcome.easy_apply { "true" } else { "false" },
        ])?;
        writer.flush()?;
        Ok(())
    }

    fn cycle_stats(&self, date: NaiveDate) -> Result<CycleStats, LedgerError> {
        let day = date.format("%Y-%m-%d").to_string();
        let mut stats = CycleStats {
            date,
            applied: 0,
            skipped: 0,
            failed: 0,
            companies: Vec::new(),
        };

        for row in self.read_rows()? {
            if !row.timestamp.starts_with(&day) {
                continue;
            }
            match row.status.as_str() {
                "applied" => {
                    stats.applied += 1;
                    stats
                        .companies
                        .push(format!("{} - {}", row.company, row.job_title));
                }
                "skipped" => stats.skipped += 1,
                "failed" => stats.failed += 1,
                _ => {}
            }
        }

        Ok(stats)
    }
}
