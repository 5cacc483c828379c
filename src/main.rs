//! `helpvault`: back up a Help Center knowledge base.
//!
//! One run discovers locales, fetches every category, section and article,
//! resolves embedded attachments, writes the raw JSON snapshot, renders each
//! article to Markdown and HTML, and finally writes `manifest.json`.

use clap::Parser;
use derive_more::{Display, Error};
use exn::ResultExt;
use helpvault_client::HelpCenter;
use helpvault_client::transport::{Credentials, HttpTransport};
use helpvault_config::{Config, Overrides, Sources};
use helpvault_library::{CollisionPolicy, Identity};
use helpvault_storage::BackendHandle;
use helpvault_storage::backend::LocalBackend;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, exn::Exn<Failure>>;

#[derive(Debug, Display, Error)]
enum Failure {
    #[display("invalid configuration")]
    Config,
    #[display("could not reach the help center")]
    Client,
    #[display("could not prepare the backup directory")]
    Output,
    #[display("backup failed")]
    Backup,
}

#[derive(Debug, Parser)]
#[command(name = "helpvault", version, about)]
struct Cli {
    /// Config file (TOML, YAML or JSON, chosen by extension).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Help Center base URL, e.g. `https://acme.zendesk.com`.
    #[arg(long)]
    domain: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Locales to back up when the platform does not list its own.
    #[arg(long, value_delimiter = ',')]
    locales: Option<Vec<String>>,
    #[arg(long)]
    default_locale: Option<String>,
    /// Parent of the timestamped backup directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Exact backup directory, bypassing the timestamped one.
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long)]
    log_level: Option<String>,
    #[arg(long)]
    concurrency: Option<i64>,
    #[arg(long)]
    timeout_secs: Option<i64>,
    /// Directory layout template for rendered articles.
    #[arg(long)]
    layout: Option<String>,
    /// Output path collisions: `warn`, `suffix` or `error`.
    #[arg(long)]
    collisions: Option<CollisionPolicy>,
    /// Cross-locale article identity: `per-locale` or `by-id`.
    #[arg(long)]
    identity: Option<Identity>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            domain: self.domain.clone(),
            email: self.email.clone(),
            locales: self.locales.clone(),
            default_locale: self.default_locale.clone(),
            output_dir: self.output_dir.clone(),
            log_level: self.log_level.clone(),
            concurrency: self.concurrency,
            timeout_secs: self.timeout_secs,
            layout: self.layout.clone(),
            collisions: self.collisions,
            identity: self.identity,
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn backup(config: &Config, output: Option<PathBuf>) -> Result<PathBuf> {
    let transport = HttpTransport::new(Credentials::new(&config.email, &config.api_token), config.timeout())
        .or_raise(|| Failure::Client)?;
    let client = HelpCenter::new(&config.domain, transport).or_raise(|| Failure::Client)?;
    let locales = client
        .locales_or(config.configured_locales())
        .await
        .or_raise(|| Failure::Client)?;
    info!(locales = ?locales.all(), default = %locales.default_locale, "backing up locales");

    let target = match output {
        Some(target) => target,
        None => config.backup_dir(OffsetDateTime::now_utc()).or_raise(|| Failure::Config)?,
    };
    let target = std::path::absolute(&target).or_raise(|| Failure::Output)?;
    let backend: BackendHandle = Arc::new(LocalBackend::new("local", &target).or_raise(|| Failure::Output)?);
    info!(path = %target.display(), "writing backup");

    let ctx = config.context(locales.default_locale.clone()).or_raise(|| Failure::Config)?;
    helpvault_library::run(&client, &backend, &locales.all(), &ctx)
        .await
        .or_raise(|| Failure::Backup)?;
    Ok(target)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(&Sources::discover(cli.config.clone()), &cli.overrides()) {
        Ok(config) => config,
        Err(err) => {
            init_logging("info");
            error!("invalid configuration: {err:?}");
            return ExitCode::FAILURE;
        },
    };
    init_logging(&config.log_level);

    match backup(&config, cli.output).await {
        Ok(target) => {
            info!(path = %target.display(), "backup complete");
            ExitCode::SUCCESS
        },
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}
