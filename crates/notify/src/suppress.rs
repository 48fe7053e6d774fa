//! Windowed duplicate suppression for noisy event kinds.
//!
//! Recurring session-progress and plan-update pings can fire several times
//! in quick succession; this is a coarse at-most-one-notification-per-window
//! throttle per `(user, group, action)` tuple, not exact deduplication of
//! identical text.

use chrono::{DateTime, Duration, Utc};

use chime_core::config::SuppressionConfig;
use chime_core::UserId;

use crate::traits::ActionLog;

/// Suppresses repeats of an action inside a trailing time window.
#[derive(Debug, Clone)]
pub struct DuplicateSuppressor {
    window: Duration,
    suppress_after: usize,
}

impl DuplicateSuppressor {
    pub fn new(window_mins: i64, suppress_after: usize) -> Self {
        Self {
            window: Duration::minutes(window_mins),
            // 0 would suppress even the first occurrence; clamp it.
            suppress_after: suppress_after.max(1),
        }
    }

    pub fn from_config(config: &SuppressionConfig) -> Self {
        Self::new(config.window_mins, config.suppress_after)
    }

    /// Whether the action already occurred enough times inside the window
    /// ending at `now`. With the default threshold of 1 the first
    /// occurrence always passes and the second is suppressed.
    pub async fn is_duplicate(
        &self,
        log: &dyn ActionLog,
        user_id: UserId,
        group_key: Option<&str>,
        action: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let since = now - self.window;
        let prior = log.count_since(user_id, group_key, action, since).await;
        prior >= self.suppress_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory stand-in for the host's rolling action log.
    struct FakeLog {
        records: Mutex<Vec<(UserId, Option<String>, String, DateTime<Utc>)>>,
    }

    impl FakeLog {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, user_id: UserId, group_key: Option<&str>, action: &str, at: DateTime<Utc>) {
            self.records.lock().unwrap().push((
                user_id,
                group_key.map(str::to_string),
                action.to_string(),
                at,
            ));
        }
    }

    #[async_trait]
    impl ActionLog for FakeLog {
        async fn count_since(
            &self,
            user_id: UserId,
            group_key: Option<&str>,
            action: &str,
            since: DateTime<Utc>,
        ) -> usize {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|(u, g, a, at)| {
                    *u == user_id && g.as_deref() == group_key && a == action && *at >= since
                })
                .count()
        }
    }

    fn at(mins: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z").unwrap().to_utc()
            + Duration::minutes(mins)
    }

    #[tokio::test]
    async fn first_occurrence_always_passes() {
        let log = FakeLog::new();
        let suppressor = DuplicateSuppressor::new(30, 1);
        assert!(
            !suppressor
                .is_duplicate(&log, 5, Some("g1"), "session_completed", at(0))
                .await
        );
    }

    #[tokio::test]
    async fn second_occurrence_inside_window_is_suppressed() {
        let log = FakeLog::new();
        log.record(5, Some("g1"), "session_completed", at(0));
        let suppressor = DuplicateSuppressor::new(30, 1);
        assert!(
            suppressor
                .is_duplicate(&log, 5, Some("g1"), "session_completed", at(10))
                .await
        );
    }

    #[tokio::test]
    async fn occurrence_outside_window_passes_again() {
        let log = FakeLog::new();
        log.record(5, Some("g1"), "session_completed", at(0));
        let suppressor = DuplicateSuppressor::new(30, 1);
        // 31 minutes later the prior record has aged out.
        assert!(
            !suppressor
                .is_duplicate(&log, 5, Some("g1"), "session_completed", at(31))
                .await
        );
    }

    #[tokio::test]
    async fn different_tuple_is_not_a_duplicate() {
        let log = FakeLog::new();
        log.record(5, Some("g1"), "session_completed", at(0));
        let suppressor = DuplicateSuppressor::new(30, 1);
        assert!(
            !suppressor
                .is_duplicate(&log, 6, Some("g1"), "session_completed", at(5))
                .await
        );
        assert!(
            !suppressor
                .is_duplicate(&log, 5, Some("g2"), "session_completed", at(5))
                .await
        );
        assert!(
            !suppressor
                .is_duplicate(&log, 5, Some("g1"), "three_month_plan_updated", at(5))
                .await
        );
    }

    #[tokio::test]
    async fn threshold_is_configurable() {
        let log = FakeLog::new();
        log.record(5, None, "three_month_plan_updated", at(0));
        let lenient = DuplicateSuppressor::new(30, 2);
        assert!(
            !lenient
                .is_duplicate(&log, 5, None, "three_month_plan_updated", at(5))
                .await
        );

        log.record(5, None, "three_month_plan_updated", at(5));
        assert!(
            lenient
                .is_duplicate(&log, 5, None, "three_month_plan_updated", at(10))
                .await
        );
    }

    #[tokio::test]
    async fn zero_threshold_is_clamped() {
        let log = FakeLog::new();
        let suppressor = DuplicateSuppressor::new(30, 0);
        assert!(
            !suppressor
                .is_duplicate(&log, 5, None, "three_month_plan_updated", at(0))
                .await
        );
    }
}
