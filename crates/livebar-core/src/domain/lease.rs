//! Bearer token lease.

use chrono::{DateTime, Duration, Utc};

/// A bearer token plus the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLease {
    pub bearer: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenLease {
    pub fn new(bearer: impl Into<String>, issued_at: DateTime<Utc>, lifetime_secs: i64) -> Self {
        Self {
            bearer: bearer.into(),
            expires_at: issued_at + Duration::seconds(lifetime_secs.max(0)),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
