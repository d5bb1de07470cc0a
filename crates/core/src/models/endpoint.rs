//! Endpoint identity and sync cadence.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One fetchable data category of one provider.
pub type EndpointId = i32;

/// Cadence delays, in seconds. An endpoint declaring [`SYNC_ALWAYS`] is due
/// on every pass.
pub const SYNC_ALWAYS: i64 = 0;
pub const HOUR: i64 = 3600;
pub const DAY: i64 = 24 * HOUR;
pub const WEEK: i64 = 7 * DAY;

/// Persisted next-eligible-sync timestamp for one (profile, endpoint) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointTimer {
    pub profile_id: i64,
    pub endpoint_id: EndpointId,
    pub next_sync: DateTime<Utc>,
}

impl EndpointTimer {
    /// Timer for an endpoint that just synced and declared `delay` seconds
    /// until it is due again.
    pub fn after_sync(
        profile_id: i64,
        endpoint_id: EndpointId,
        now: DateTime<Utc>,
        delay: i64,
    ) -> Self {
        Self {
            profile_id,
            endpoint_id,
            next_sync: now + Duration::seconds(delay),
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sync_always_is_immediately_due() {
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        let timer = EndpointTimer::after_sync(1, 2000, now, SYNC_ALWAYS);
        assert!(timer.is_due(now));
    }

    #[test]
    fn four_day_cadence_respected() {
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        let timer = EndpointTimer::after_sync(1, 1000, now, 4 * DAY);
        assert!(!timer.is_due(now + Duration::days(1)));
        assert!(!timer.is_due(now + Duration::days(3)));
        assert!(timer.is_due(now + Duration::days(5)));
    }

    #[test]
    fn timer_round_trip() {
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        let timer = EndpointTimer::after_sync(1, 3000, now, WEEK);
        let json = serde_json::to_string(&timer).unwrap();
        let back: EndpointTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, timer);
    }
}
