//! globe entry point.
//!
//! Loads configuration, opens the local store, runs one refresh and prints the
//! published country list to stdout. `--force` skips the cache check; see
//! `cli::Args`.
//! Logging goes to stderr so stdout carries only the list.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use globe_client::{ClientConfig, CountryApiClient};
use globe_core::{AppConfig, CountryDb, Notice, RefreshCoordinator, RefreshObserver, RefreshPath, SystemClock};
use tracing_subscriber::EnvFilter;

mod cli;
mod render;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    match run(args.force).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "globe failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(force: bool) -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let db = CountryDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let client = CountryApiClient::new(ClientConfig::from_app_config(&config))?;
    tracing::info!(endpoint = %client.endpoint(), force, "starting globe");

    let coordinator = RefreshCoordinator::new(
        Arc::new(client),
        Arc::new(db.clone()),
        Arc::new(db.clone()),
        Arc::new(SystemClock),
        config.refresh_threshold(),
    );
    let mut observer = coordinator.subscribe();

    let outcome = refresh_once(&coordinator, force).await;
    coordinator.dispose().await;
    let path = outcome?;

    report(&mut observer, path);
    let countries = if observer.is_error() { db.get_all_countries().await? } else { observer.countries() };
    render::write_countries(&mut std::io::stdout().lock(), &countries)?;

    let stored = db.count_countries().await?;
    tracing::info!(stored, "done");
    Ok(())
}

async fn refresh_once(coordinator: &RefreshCoordinator, force: bool) -> Result<RefreshPath> {
    let path = if force { coordinator.force_refresh().await? } else { coordinator.refresh().await? };
    coordinator.wait_idle().await?;
    Ok(path)
}

fn report(observer: &mut RefreshObserver, path: RefreshPath) {
    for notice in observer.pending_notices() {
        match notice {
            Notice::FromCache { count } => tracing::info!(count, "countries from local store"),
            Notice::FromNetwork { count } => tracing::info!(count, "countries from network"),
        }
    }

    if observer.is_error() {
        tracing::warn!(?path, "country fetch failed; showing the last stored list");
    }
}
