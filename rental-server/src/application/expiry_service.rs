use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;

/// Batch job moving active posts past their deadline to `expired`.
pub(crate) struct ExpiryService {
    repo: Arc<dyn PostRepository>,
}

impl ExpiryService {
    pub(crate) fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// Only the number of expired rows leaves this function.
    pub(crate) async fn expire_posts(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let expired_count = self.repo.expire_stale(now).await?;
        info!(expired_count, "expiry sweep finished");
        Ok(expired_count)
    }
}

/// Runs the sweep every `period` until `shutdown` flips to `true`.
pub(crate) fn spawn_expiry_schedule(
    service: Arc<ExpiryService>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(err) = service.expire_posts(Utc::now()).await {
                        error!(error = %err, "scheduled expiry sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("expiry schedule stopped");
                        break;
                    }
                }
            }
        }
    })
}
