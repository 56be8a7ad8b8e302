//! Core engine for the automated job application service.
//!
//! The library is organized around a small set of capability traits
//! ([`browser::BrowserSession`], [`ledger::OutcomeLedger`],
//! [`notify::Notifier`], [`artifact::ResumeProvider`]) and the engine that
//! drives them: listing extraction, the application flow state machine, and
//! per-platform cycle orchestration. Platform-specific knowledge (selectors,
//! login procedures, URL templates) lives in [`platforms`] as data.

pub mod artifact;
pub mod browser;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod platforms;
pub mod profile;
pub mod telemetry;
