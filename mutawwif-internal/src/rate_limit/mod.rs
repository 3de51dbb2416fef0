//! Per-identity daily usage counting for the Basic tier.
//!
//! The counters are process-local and in-memory: horizontal scaling or a
//! restart silently resets all quotas, and the identity key is derived from a
//! client-supplied header. The limiter is advisory, not a security boundary.

pub mod middleware;

use chrono::{Local, NaiveDate};
use dashmap::DashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UsageDecision {
    Admit { count: u32 },
    Deny { limit: u32 },
}

impl UsageDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, UsageDecision::Admit { .. })
    }
}

#[derive(Debug)]
struct UsageEntry {
    day: NaiveDate,
    count: u32,
}

/// Daily request counter keyed by client identity.
///
/// Entries are mutated in place under the per-key `DashMap` entry lock, so two
/// concurrent requests for the same key cannot both observe the same
/// pre-increment count. The map is never evicted.
#[derive(Debug)]
pub struct DailyUsageLimiter {
    entries: DashMap<String, UsageEntry>,
    limit: u32,
}

impl DailyUsageLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Admit or deny a request for `identity_key` on the server's current
    /// calendar day.
    pub fn admit(&self, identity_key: &str) -> UsageDecision {
        self.admit_on(identity_key, Local::now().date_naive())
    }

    /// Day-explicit variant of [`Self::admit`], used by the tests to exercise
    /// the day-rollover path without a clock.
    fn admit_on(&self, identity_key: &str, today: NaiveDate) -> UsageDecision {
        match self.entries.entry(identity_key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.day != today {
                    // A new calendar day resets the count to 1
                    *entry = UsageEntry {
                        day: today,
                        count: 1,
                    };
                    UsageDecision::Admit { count: 1 }
                } else if entry.count >= self.limit {
                    UsageDecision::Deny { limit: self.limit }
                } else {
                    entry.count += 1;
                    UsageDecision::Admit { count: entry.count }
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(UsageEntry {
                    day: today,
                    count: 1,
                });
                UsageDecision::Admit { count: 1 }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(ordinal: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, ordinal).expect("valid test date")
    }

    #[test]
    fn test_admits_up_to_limit_then_denies() {
        let limiter = DailyUsageLimiter::new(3);
        let today = day(1);

        assert_eq!(
            limiter.admit_on("1.2.3.4", today),
            UsageDecision::Admit { count: 1 }
        );
        assert_eq!(
            limiter.admit_on("1.2.3.4", today),
            UsageDecision::Admit { count: 2 }
        );
        assert_eq!(
            limiter.admit_on("1.2.3.4", today),
            UsageDecision::Admit { count: 3 }
        );
        // The (limit + 1)th request is denied
        assert_eq!(
            limiter.admit_on("1.2.3.4", today),
            UsageDecision::Deny { limit: 3 }
        );
        assert!(!limiter.admit_on("1.2.3.4", today).is_admitted());
    }

    #[test]
    fn test_next_day_resets_count_to_one() {
        let limiter = DailyUsageLimiter::new(2);
        assert!(limiter.admit_on("key", day(1)).is_admitted());
        assert!(limiter.admit_on("key", day(1)).is_admitted());
        assert!(!limiter.admit_on("key", day(1)).is_admitted());

        assert_eq!(
            limiter.admit_on("key", day(2)),
            UsageDecision::Admit { count: 1 }
        );
    }

    #[test]
    fn test_identity_keys_are_counted_independently() {
        let limiter = DailyUsageLimiter::new(1);
        let today = day(1);
        assert!(limiter.admit_on("a", today).is_admitted());
        assert!(limiter.admit_on("b", today).is_admitted());
        assert!(!limiter.admit_on("a", today).is_admitted());
        assert!(!limiter.admit_on("b", today).is_admitted());
    }

    #[test]
    fn test_stale_day_in_the_past_also_resets() {
        // The clock moving backwards still reinitializes the entry: any
        // stored day that differs from "today" is stale.
        let limiter = DailyUsageLimiter::new(1);
        assert!(limiter.admit_on("key", day(5)).is_admitted());
        assert!(!limiter.admit_on("key", day(5)).is_admitted());
        assert!(limiter.admit_on("key", day(4)).is_admitted());
    }

    #[test]
    fn test_concurrent_admits_never_exceed_limit() {
        use std::sync::Arc;

        let limiter = Arc::new(DailyUsageLimiter::new(50));
        let today = day(1);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(std::thread::spawn(move || {
                let mut admitted = 0u32;
                for _ in 0..20 {
                    if limiter.admit_on("shared", today).is_admitted() {
                        admitted += 1;
                    }
                }
                admitted
            }));
        }
        let total: u32 = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .sum();
        assert_eq!(total, 50);
    }
}
