//! chartsync: republish daily streaming top-10 charts into Trakt lists.
//!
//! Scrapes the configured FlixPatrol charts, resolves every entry to a TMDB
//! identity through the matching cascade, and replaces the contents of the
//! corresponding Trakt lists. Sections that fail are reported in the
//! end-of-run summary; only a rejected Trakt credential aborts the run.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chartsync_config::{chart_plan, Config};
use chartsync_core::dest::TraktClient;
use chartsync_core::feed::FlixPatrolFeed;
use chartsync_core::providers::TmdbProvider;
use chartsync_core::resolve::Resolver;
use chartsync_core::retry::RetryPolicy;
use chartsync_core::sync::{SyncOptions, SyncRunner};

#[derive(Debug, Parser)]
#[command(name = "chartsync", version, about = "Daily streaming-chart to Trakt list sync")]
struct Cli {
    /// Also process the supplementary kids chart sections.
    #[arg(long)]
    kids: bool,

    /// Dump every resolved section table before updating lists.
    #[arg(long)]
    print_lists: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape, resolve, and update the destination lists (the default).
    Sync,
    /// Fetch one chart page and report its heading/table structure.
    Diagnose {
        /// Chart page URL.
        url: String,
        /// Section heading to look for.
        #[arg(default_value = "TOP 10 Movies")]
        section: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    config.kids_lists |= cli.kids;
    config.print_lists |= cli.print_lists;

    let result = match cli.command {
        Some(Command::Diagnose { url, section }) => diagnose(&config, &url, &section).await,
        Some(Command::Sync) | None => sync(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn sync(config: &Config) -> anyhow::Result<()> {
    let (client_id, access_token) = config
        .trakt_credentials()
        .context("CLIENT_ID and ACCESS_TOKEN must be set to update destination lists")?;

    let feed = FlixPatrolFeed::new(config.request_timeout)?;
    let provider = config
        .tmdb_api_key
        .clone()
        .map(|key| TmdbProvider::new(key, config.request_timeout))
        .transpose()?;
    let resolver = Resolver::new(provider);
    let trakt = TraktClient::new(client_id, access_token, config.request_timeout)?;
    let retry = RetryPolicy::new(config.max_retries, config.backoff_factor);

    let yesterday = chrono::Utc::now()
        .date_naive()
        .pred_opt()
        .context("date arithmetic underflow")?;
    let tasks = chart_plan(config.kids_lists, yesterday);

    let mut runner = SyncRunner::new(
        feed,
        resolver,
        trakt,
        retry,
        tasks,
        SyncOptions {
            print_lists: config.print_lists,
        },
    );
    runner.run().await?;
    Ok(())
}

async fn diagnose(config: &Config, url: &str, section: &str) -> anyhow::Result<()> {
    let mut feed = FlixPatrolFeed::new(config.request_timeout)?;
    let report = feed
        .diagnose(url, section)
        .await
        .with_context(|| format!("failed to fetch {url}"))?;
    println!("{report}");
    Ok(())
}
