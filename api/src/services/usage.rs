//! Monthly request metering

use chrono::{DateTime, Datelike, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// Request counts per tenant per calendar month (UTC)
#[derive(Default)]
pub struct UsageMeter {
    requests: DashMap<(Uuid, i32, u32), i64>,
}

impl UsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request for `tenant_id` at `at`
    pub fn record_request(&self, tenant_id: Uuid, at: DateTime<Utc>) -> i64 {
        let mut count = self.requests.entry(period_key(tenant_id, at)).or_insert(0);
        *count += 1;
        *count
    }

    /// Requests counted in the month containing `at`
    pub fn requests_in_period(&self, tenant_id: Uuid, at: DateTime<Utc>) -> i64 {
        self.requests.get(&period_key(tenant_id, at)).map_or(0, |c| *c)
    }

    pub fn current_requests(&self, tenant_id: Uuid) -> i64 {
        self.requests_in_period(tenant_id, Utc::now())
    }
}

fn period_key(tenant_id: Uuid, at: DateTime<Utc>) -> (Uuid, i32, u32) {
    (tenant_id, at.year(), at.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_counts_roll_over_by_month() {
        let meter = UsageMeter::new();
        let tenant = Uuid::new_v4();
        let jan = Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

        meter.record_request(tenant, jan);
        assert_eq!(meter.record_request(tenant, jan), 2);
        meter.record_request(tenant, feb);

        assert_eq!(meter.requests_in_period(tenant, jan), 2);
        assert_eq!(meter.requests_in_period(tenant, feb), 1);
        assert_eq!(meter.requests_in_period(Uuid::new_v4(), feb), 0);
    }
}
