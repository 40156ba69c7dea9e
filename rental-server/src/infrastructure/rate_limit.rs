use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::settings::RateLimitSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RateLimitClass {
    Read,
    Write,
    Auth,
}

impl RateLimitClass {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            RateLimitClass::Read => "read",
            RateLimitClass::Write => "write",
            RateLimitClass::Auth => "auth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

/// Sliding-window counters keyed by client address and request class.
pub(crate) struct RateLimiter {
    settings: RateLimitSettings,
    window: Duration,
    hits: DashMap<(IpAddr, RateLimitClass), VecDeque<Instant>>,
}

impl RateLimiter {
    pub(crate) fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            window: Duration::from_secs(settings.window_secs),
            hits: DashMap::new(),
        }
    }

    fn limit_for(&self, class: RateLimitClass) -> usize {
        match class {
            RateLimitClass::Read => self.settings.read_per_window,
            RateLimitClass::Write => self.settings.write_per_window,
            RateLimitClass::Auth => self.settings.auth_per_window,
        }
    }

    pub(crate) fn check(&self, ip: IpAddr, class: RateLimitClass) -> RateDecision {
        self.check_at(ip, class, Instant::now())
    }

    pub(crate) fn check_at(&self, ip: IpAddr, class: RateLimitClass, now: Instant) -> RateDecision {
        let limit = self.limit_for(class);
        let mut entry = self.hits.entry((ip, class)).or_default();
        let timestamps = entry.value_mut();

        while timestamps
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= self.window)
        {
            timestamps.pop_front();
        }

        if timestamps.len() >= limit {
            let retry_after = timestamps
                .front()
                .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        timestamps.push_back(now);
        RateDecision::Allowed
    }

    /// Drops keys whose newest hit is older than the window.
    pub(crate) fn purge_idle(&self, now: Instant) -> usize {
        let before = self.hits.len();
        self.hits.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < self.window)
        });
        before - self.hits.len()
    }
}
