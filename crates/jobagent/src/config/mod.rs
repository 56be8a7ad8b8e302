use crate::engine::flow::SubmissionPolicy;
use crate::profile::ApplicantProfile;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the service, built once at startup and passed
/// by parameter from there on.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub browser: BrowserConfig,
    pub engine: EngineConfig,
    pub search: SearchConfig,
    pub artifacts: ArtifactConfig,
    pub ledger: LedgerConfig,
    pub credentials: CredentialsConfig,
    pub applicant: ApplicantProfile,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let cdp_endpoint =
            env::var("BROWSER_CDP_URL").unwrap_or_else(|_| "http://127.0.0.1:9222".to_string());

        let max_applications_per_run = parse_env("MAX_APPLICATIONS_PER_RUN", 50)? as u32;
        let result_pages_per_query = parse_env("RESULT_PAGES_PER_QUERY", 3)? as u32;
        let step_cap = parse_env("FLOW_STEP_CAP", 10)? as u32;
        let action_delay_seconds = parse_env_f64("ACTION_DELAY_SECONDS", 3.0)?;
        let cycle_interval_seconds = parse_env("CYCLE_INTERVAL_SECONDS", 600)?;

        let submit_policy = match env::var("SUBMIT_POLICY")
            .unwrap_or_else(|_| "optimistic".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "optimistic" => SubmissionPolicy::OptimisticApplied,
            "strict" => SubmissionPolicy::StrictConfirmation,
            _ => return Err(ConfigError::InvalidSubmitPolicy),
        };

        let titles = parse_list(
            &env::var("TARGET_JOB_TITLES").unwrap_or_else(|_| "Software Engineer".to_string()),
        );
        let locations =
            parse_list(&env::var("SEARCH_LOCATIONS").unwrap_or_else(|_| "Remote".to_string()));

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let resume_path = env::var("RESUME_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("resume.pdf"));
        let resume_url = env::var("RESUME_URL").ok().filter(|url| !url.is_empty());
        let applications_csv = data_dir.join("applications.csv");

        let credentials = CredentialsConfig {
            linkedin: PlatformCredentials {
                email: env::var("LINKEDIN_EMAIL").unwrap_or_default(),
                password: env::var("LINKEDIN_PASSWORD").unwrap_or_default(),
            },
            indeed: PlatformCredentials {
                email: env::var("INDEED_EMAIL").unwrap_or_default(),
                password: env::var("INDEED_PASSWORD").unwrap_or_default(),
            },
        };

        let applicant = ApplicantProfile {
            first_name: env::var("APPLICANT_FIRST_NAME").unwrap_or_default(),
            last_name: env::var("APPLICANT_LAST_NAME").unwrap_or_default(),
            email: env::var("APPLICANT_EMAIL").unwrap_or_default(),
            phone: env::var("APPLICANT_PHONE").unwrap_or_default(),
            city: env::var("APPLICANT_CITY").unwrap_or_default(),
            state_province: env::var("APPLICANT_STATE").unwrap_or_default(),
            country: env::var("APPLICANT_COUNTRY").unwrap_or_default(),
            years_of_experience: env::var("APPLICANT_YEARS_OF_EXPERIENCE").unwrap_or_default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            browser: BrowserConfig { cdp_endpoint },
            engine: EngineConfig {
                max_applications_per_run,
                result_pages_per_query,
                step_cap,
                submit_policy,
                action_delay: Duration::from_secs_f64(action_delay_seconds),
                cycle_interval: Duration::from_secs(cycle_interval_seconds),
            },
            search: SearchConfig { titles, locations },
            artifacts: ArtifactConfig {
                resume_path,
                resume_url,
            },
            ledger: LedgerConfig { applications_csv },
            credentials,
            applicant,
        })
    }
}

/// Settings controlling the status server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where to reach the Chrome DevTools endpoint.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub cdp_endpoint: String,
}

/// Knobs for the application engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_applications_per_run: u32,
    pub result_pages_per_query: u32,
    pub step_cap: u32,
    pub submit_policy: SubmissionPolicy,
    pub action_delay: Duration,
    pub cycle_interval: Duration,
}

/// Search targets, kept in configured order.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub titles: Vec<String>,
    pub locations: Vec<String>,
}

/// Resume artifact locations.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub resume_path: PathBuf,
    pub resume_url: Option<String>,
}

/// Outcome ledger location.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub applications_csv: PathBuf,
}

/// Login credentials for one platform.
#[derive(Debug, Clone, Default)]
pub struct PlatformCredentials {
    pub email: String,
    pub password: String,
}

impl PlatformCredentials {
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialsConfig {
    pub linkedin: PlatformCredentials,
    pub indeed: PlatformCredentials,
}

// Semicolons take precedence so entries may themselves contain commas
// ("Toronto, ON; Remote").
fn parse_list(raw: &str) -> Vec<String> {
    let separator = if raw.contains(';') { ';' } else { ',' };
    raw.split(separator)
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn parse_env(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn parse_env_f64(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("{key} must be a valid number")]
    InvalidNumber { key: &'static str },
    #[error("SUBMIT_POLICY must be 'optimistic' or 'strict'")]
    InvalidSubmitPolicy,
}
