use chrono::{DateTime, Duration, Utc};

pub(crate) const RENEWAL_WINDOW_DAYS: i64 = 14;

/// Counted from the renewal moment, never from the previous deadline.
pub(crate) fn renewal_deadline(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(RENEWAL_WINDOW_DAYS)
}
