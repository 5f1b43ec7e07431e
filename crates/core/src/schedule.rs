//! Deterministic spaced-review scheduling.
//!
//! An Ebbinghaus-curve approximation: a fixed table of offsets applied to
//! "now". Pure, no I/O, no provider dependency — the schedule for an item
//! is fully regenerable and is always replaced wholesale, never patched.

use chrono::{DateTime, Duration, Utc};

/// Review offsets in minutes: 20 min, 1 h, 9 h, 1 d, 2 d, 4 d, 7 d, 15 d.
pub const REVIEW_OFFSETS_MINUTES: [i64; 8] =
    [20, 60, 540, 1_440, 2_880, 5_760, 10_080, 21_600];

/// Compute the review instants for an item created at `now`, in interval
/// order.
pub fn compute_review_schedule(now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    REVIEW_OFFSETS_MINUTES
        .iter()
        .map(|&minutes| now + Duration::minutes(minutes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn schedule_is_deterministic() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(compute_review_schedule(now), compute_review_schedule(now));
    }

    #[test]
    fn schedule_is_strictly_increasing_and_after_now() {
        let now = Utc::now();
        let schedule = compute_review_schedule(now);
        assert_eq!(schedule.len(), REVIEW_OFFSETS_MINUTES.len());
        assert!(schedule[0] > now);
        for window in schedule.windows(2) {
            assert!(window[0] < window[1]);
        }
    }

    #[test]
    fn first_and_last_offsets_match_the_curve() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let schedule = compute_review_schedule(now);
        assert_eq!(schedule[0], now + Duration::minutes(20));
        assert_eq!(schedule[7], now + Duration::days(15));
    }
}
