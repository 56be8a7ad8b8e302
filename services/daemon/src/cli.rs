use clap::{Args, Parser, Subcommand};
use jobagent::browser::CdpBrowser;
use jobagent::config::AppConfig;
use jobagent::error::AppError;
use jobagent::telemetry;
use tracing::info;

use crate::infra::{self, PlatformFilter};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Job Application Agent",
    about = "Run the automated job application service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the persistent service: scheduled cycles plus the status server
    /// (default command)
    Serve(ServeArgs),
    /// Run a single application cycle and exit
    Once(OnceArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the status server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the status server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Only run the LinkedIn platform
    #[arg(long, conflicts_with = "indeed_only")]
    pub(crate) linkedin_only: bool,
    /// Only run the Indeed platform
    #[arg(long)]
    pub(crate) indeed_only: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OnceArgs {
    /// Only run the LinkedIn platform
    #[arg(long, conflicts_with = "indeed_only")]
    pub(crate) linkedin_only: bool,
    /// Only run the Indeed platform
    #[arg(long)]
    pub(crate) indeed_only: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Once(args) => run_once(args).await,
    }
}

async fn run_once(args: OnceArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let filter = PlatformFilter::from_flags(args.linkedin_only, args.indeed_only);
    let orchestrator = infra::build_orchestrator(&config, filter);

    let session = CdpBrowser::connect(&config.browser.cdp_endpoint).await?;
    let applied = orchestrator.run_cycle(&session).await;
    info!(applied, "single cycle complete");

    Ok(())
}
