//! Command handlers, called from `main` once the pool and config are ready.

use std::sync::Arc;

use anyhow::Context;
use ccdb_core::counties::normalize_county_name;
use ccdb_core::{AppConfig, County, Store};
use ccdb_db::PgStore;
use ccdb_scraper::{HtmlParser, MapQuestGeocoder, OdjfsClient};
use ccdb_sync::{ChildCareSynchronizer, CountySynchronizer, GeocodeSynchronizer, RefreshOutcome};
use chrono::Utc;
use sqlx::PgPool;

use crate::ticks::{run_ticks, Pacing, TickStatus};

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = ccdb_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Insert the counties listed in the counties file.
///
/// # Errors
///
/// Returns an error if the counties file is missing or invalid, or if the
/// insert fails.
pub(crate) async fn run_seed_counties(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let counties_file = ccdb_core::load_counties(&config.counties_path)?;
    let counties = counties_file.to_counties();
    let inserted = ccdb_db::seed_counties(pool, &counties).await?;
    println!(
        "seeded {inserted} new of {} counties from {}",
        counties.len(),
        config.counties_path.display()
    );
    Ok(())
}

fn build_client(config: &AppConfig) -> anyhow::Result<OdjfsClient> {
    OdjfsClient::new(
        &config.scraper_base_url,
        &config.scraper_user_agent,
        config.scraper_request_timeout_secs,
    )
    .context("failed to build ODJFS client")
}

fn store(pool: PgPool) -> Arc<dyn Store> {
    Arc::new(PgStore::new(pool))
}

/// Refresh one county's listing, whatever its place in the rotation.
pub(crate) async fn run_county_one(
    pool: PgPool,
    config: &AppConfig,
    name: &str,
) -> anyhow::Result<()> {
    let store = store(pool);
    let sync = CountySynchronizer::new(build_client(config)?, Arc::new(HtmlParser), store.clone());

    let county = County::new(normalize_county_name(name));
    let report = sync.refresh_listing(&county).await?;
    store.mark_county_scraped(&county.name, Utc::now()).await?;

    println!(
        "{}: {} found, {} new, {} updated{}",
        report.county,
        report.found,
        report.inserted,
        report.updated,
        if report.absent { " (no listing)" } else { "" }
    );
    Ok(())
}

pub(crate) async fn run_county_next(pool: PgPool, config: &AppConfig, n: u32) -> anyhow::Result<()> {
    let sync = CountySynchronizer::new(build_client(config)?, Arc::new(HtmlParser), store(pool));

    let summary = run_ticks("county", n, Pacing::from_app_config(config), || async {
        sync.refresh_next_county().await.map(|report| match report {
            Some(_) => TickStatus::Progress,
            None => TickStatus::Idle,
        })
    })
    .await?;

    println!("refreshed {} county listing(s)", summary.progressed);
    Ok(())
}

pub(crate) async fn run_child_care_one(
    pool: PgPool,
    config: &AppConfig,
    external_url_id: &str,
) -> anyhow::Result<()> {
    let sync = ChildCareSynchronizer::new(build_client(config)?, Arc::new(HtmlParser), store(pool));

    match sync.refresh_one(external_url_id).await? {
        RefreshOutcome::Refreshed { kind, promoted, .. } => {
            let note = if promoted { " (new)" } else { "" };
            println!("{external_url_id}: refreshed {kind}{note}");
        }
        RefreshOutcome::Absent { .. } => {
            println!("{external_url_id}: source has no data; marked checked");
        }
        RefreshOutcome::Idle => {}
    }
    Ok(())
}

pub(crate) async fn run_child_care_next(
    pool: PgPool,
    config: &AppConfig,
    n: u32,
) -> anyhow::Result<()> {
    let sync = ChildCareSynchronizer::new(build_client(config)?, Arc::new(HtmlParser), store(pool));

    let summary = run_ticks("childcare", n, Pacing::from_app_config(config), || async {
        sync.refresh_next().await.map(|outcome| match outcome {
            RefreshOutcome::Idle => TickStatus::Idle,
            RefreshOutcome::Refreshed { .. } | RefreshOutcome::Absent { .. } => {
                TickStatus::Progress
            }
        })
    })
    .await?;

    println!(
        "refreshed {} record(s); {} retryable failure(s), {} timeout(s)",
        summary.progressed, summary.retried, summary.timed_out
    );
    Ok(())
}

pub(crate) async fn run_geocode(pool: PgPool, config: &AppConfig, limit: usize) -> anyhow::Result<()> {
    let api_key = config
        .mapquest_api_key
        .as_deref()
        .context("CCDB_MAPQUEST_API_KEY must be set to geocode")?;
    let geocoder = MapQuestGeocoder::new(api_key, config.scraper_request_timeout_secs)?;
    let sync = GeocodeSynchronizer::new(store(pool), Arc::new(geocoder));

    let report = sync.geocode_pass(limit).await?;
    println!(
        "geocoded {} of {} record(s)",
        report.geocoded, report.attempted
    );
    for failure in &report.failures {
        println!("  {}: {}", failure.external_url_id, failure.error);
    }
    Ok(())
}
