use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info};

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::access_service::AccessService;
use application::admin_service::AdminService;
use application::expiry_service::{ExpiryService, spawn_expiry_schedule};
use application::listing_service::ListingService;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::profile_repository::PostgresProfileRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtVerifier;
use infrastructure::logging::init_logging;
use infrastructure::rate_limit::RateLimiter;
use infrastructure::settings::Settings;
use presentation::{AppState, CronAuth};

const RATE_LIMIT_PURGE_PERIOD: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env().context("failed to load settings")?;

    init_logging(&settings.log_level, settings.is_production())?;
    info!(environment = ?settings.environment, "starting rental-server");

    let pool = create_pool(&settings.database_url, settings.database_max_connections).await?;
    run_migrations(&pool).await?;

    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));
    let profile_repo = Arc::new(PostgresProfileRepository::new(pool.clone()));

    let expiry = Arc::new(ExpiryService::new(post_repo.clone()));
    let rate_limiter = Arc::new(RateLimiter::new(settings.rate_limit));

    let state = AppState {
        access: Arc::new(AccessService::new(profile_repo.clone())),
        listing: Arc::new(ListingService::new(post_repo.clone())),
        admin: Arc::new(AdminService::new(post_repo, profile_repo)),
        expiry: expiry.clone(),
        jwt: Arc::new(JwtVerifier::new(&settings.jwt_secret)),
        rate_limiter: rate_limiter.clone(),
        cron: CronAuth {
            secret: settings.cron_secret.clone(),
            required: settings.is_production(),
        },
        trust_proxy_headers: settings.trust_proxy_headers,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweep = settings.expiry_sweep_enabled.then(|| {
        info!(
            interval_secs = settings.expiry_sweep_interval_secs,
            "in-process expiry schedule enabled"
        );
        spawn_expiry_schedule(
            expiry,
            Duration::from_secs(settings.expiry_sweep_interval_secs),
            shutdown_rx.clone(),
        )
    });

    let mut purge_shutdown = shutdown_rx;
    let purge = tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PURGE_PERIOD);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let purged = rate_limiter.purge_idle(Instant::now());
                    debug!(purged, "rate limiter keys purged");
                }
                changed = purge_shutdown.changed() => {
                    if changed.is_err() || *purge_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    });

    server::run_http(&settings, state, shutdown_tx).await?;

    if let Some(sweep) = sweep {
        sweep.await?;
    }
    purge.await?;
    pool.close().await;

    Ok(())
}
