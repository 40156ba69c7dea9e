use std::sync::Arc;

use crate::application::access_service::AccessService;
use crate::application::admin_service::AdminService;
use crate::application::expiry_service::ExpiryService;
use crate::application::listing_service::ListingService;
use crate::infrastructure::jwt::JwtVerifier;
use crate::infrastructure::rate_limit::RateLimiter;

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;


/// Shared secret guarding the sweep trigger.
#[derive(Debug, Clone)]
pub(crate) struct CronAuth {
    pub(crate) secret: Option<String>,
    pub(crate) required: bool,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) access: Arc<AccessService>,
    pub(crate) listing: Arc<ListingService>,
    pub(crate) admin: Arc<AdminService>,
    pub(crate) expiry: Arc<ExpiryService>,
    pub(crate) jwt: Arc<JwtVerifier>,
    pub(crate) rate_limiter: Arc<RateLimiter>,
    pub(crate) cron: CronAuth,
    pub(crate) trust_proxy_headers: bool,
}
