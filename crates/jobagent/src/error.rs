use crate::artifact::ArtifactError;
use crate::browser::BrowserError;
use crate::config::ConfigError;
use crate::ledger::LedgerError;
use crate::telemetry::TelemetryError;

/// Top-level error for the service binaries.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
