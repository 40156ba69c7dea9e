use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::domain::error::DomainError;
use crate::infrastructure::rate_limit::{RateDecision, RateLimitClass, RateLimiter};
use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

#[derive(Clone)]
pub(crate) struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
    class: RateLimitClass,
    trust_proxy_headers: bool,
}

impl RateLimitGuard {
    pub(crate) fn new(state: &AppState, class: RateLimitClass) -> Self {
        Self {
            limiter: state.rate_limiter.clone(),
            class,
            trust_proxy_headers: state.trust_proxy_headers,
        }
    }
}

pub(crate) async fn enforce_rate_limit(
    State(guard): State<RateLimitGuard>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(request.headers(), peer, guard.trust_proxy_headers);

    match guard.limiter.check(ip, guard.class) {
        RateDecision::Allowed => Ok(next.run(request).await),
        RateDecision::Limited { retry_after } => {
            tracing::debug!(%ip, class = guard.class.as_str(), "rate limit hit");
            Err(DomainError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            }
            .into())
        }
    }
}

pub(crate) fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy: bool) -> IpAddr {
    if trust_proxy
        && let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok())
    {
        return forwarded;
    }
    peer.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
