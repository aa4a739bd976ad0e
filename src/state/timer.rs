//! Time derivation helpers.
//!
//! Nothing here keeps a running clock: every value is recomputed from a stored
//! anchor timestamp, a fixed budget and the observation instant, so a cold
//! process reading persisted state reports exactly what a warm one would.

use std::time::SystemTime;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Whole seconds elapsed between `start` and `now`, floored.
///
/// An anchor in the future (clock skew between writers) counts as zero elapsed.
pub fn elapsed_seconds(start: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(start)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Seconds left on a `duration_seconds` budget anchored at `start`.
///
/// Without an anchor the budget has not started and is returned untouched.
pub fn remaining_seconds(duration_seconds: u64, start: Option<SystemTime>, now: SystemTime) -> u64 {
    match start {
        Some(start) => duration_seconds.saturating_sub(elapsed_seconds(start, now)),
        None => duration_seconds,
    }
}

/// Remaining time of a round timer, split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerReading {
    /// Raw remaining seconds.
    pub remaining: u64,
}

impl TimerReading {
    /// Wrap a remaining-seconds value.
    pub fn new(remaining: u64) -> Self {
        Self { remaining }
    }

    /// Whole minutes part (`floor(remaining / 60)`, not capped at 59).
    pub fn minutes(&self) -> u64 {
        self.remaining / SECONDS_PER_MINUTE
    }

    /// Seconds part (`remaining % 60`).
    pub fn seconds(&self) -> u64 {
        self.remaining % SECONDS_PER_MINUTE
    }

    /// Zero padded `MM:SS` string.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.minutes(), self.seconds())
    }

    /// True once the budget is exhausted.
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

/// Day/hour/minute/second decomposition used by the pre-game countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownBreakdown {
    /// Whole days.
    pub days: u64,
    /// Hours within the day.
    pub hours: u64,
    /// Minutes within the hour.
    pub minutes: u64,
    /// Seconds within the minute.
    pub seconds: u64,
}

impl CountdownBreakdown {
    /// Split a number of seconds using 86400/3600/60 remainder chaining.
    pub fn from_seconds(total: u64) -> Self {
        Self {
            days: total / SECONDS_PER_DAY,
            hours: (total % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }

    /// Recompose the total number of seconds.
    ///
    /// Fields are not required to be normalised (`minutes: 90` is accepted), which
    /// matches what admins can type into the countdown form.
    pub fn total_seconds(&self) -> u64 {
        self.days
            .saturating_mul(SECONDS_PER_DAY)
            .saturating_add(self.hours.saturating_mul(SECONDS_PER_HOUR))
            .saturating_add(self.minutes.saturating_mul(SECONDS_PER_MINUTE))
            .saturating_add(self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn unstarted_timer_reports_full_budget() {
        assert_eq!(remaining_seconds(300, None, at(10_000)), 300);
    }

    #[test]
    fn remaining_is_budget_minus_elapsed_clamped_at_zero() {
        for duration in [0u64, 1, 59, 60, 300, 3_600] {
            for elapsed in [0u64, 1, 59, 60, 299, 300, 301, 7_200] {
                let remaining = remaining_seconds(duration, Some(at(0)), at(elapsed));
                assert_eq!(remaining, duration.saturating_sub(elapsed));
                assert_eq!(remaining == 0, elapsed >= duration);
            }
        }
    }

    #[test]
    fn elapsed_floors_partial_seconds() {
        let start = at(0);
        let now = start + Duration::from_millis(2_999);
        assert_eq!(elapsed_seconds(start, now), 2);
        assert_eq!(remaining_seconds(10, Some(start), now), 8);
    }

    #[test]
    fn future_anchor_counts_as_not_elapsed() {
        assert_eq!(elapsed_seconds(at(50), at(10)), 0);
        assert_eq!(remaining_seconds(30, Some(at(50)), at(10)), 30);
    }

    #[test]
    fn derivation_is_repeatable() {
        let first = remaining_seconds(300, Some(at(0)), at(120));
        let second = remaining_seconds(300, Some(at(0)), at(120));
        assert_eq!(first, second);
        assert_eq!(first, 180);
    }

    #[test]
    fn display_is_zero_padded() {
        assert_eq!(TimerReading::new(0).display(), "00:00");
        assert_eq!(TimerReading::new(65).display(), "01:05");
        assert_eq!(TimerReading::new(300).display(), "05:00");
        assert_eq!(TimerReading::new(6_000).display(), "100:00");
    }

    #[test]
    fn breakdown_recomposes_to_the_same_total() {
        for total in [0u64, 1, 59, 60, 3_599, 3_600, 86_399, 86_400, 90_061, 1_000_000] {
            assert_eq!(CountdownBreakdown::from_seconds(total).total_seconds(), total);
        }
    }

    #[test]
    fn half_hour_breakdown() {
        let breakdown = CountdownBreakdown::from_seconds(1_800);
        assert_eq!(
            breakdown,
            CountdownBreakdown {
                days: 0,
                hours: 0,
                minutes: 30,
                seconds: 0,
            }
        );
    }

    #[test]
    fn unnormalised_fields_still_sum() {
        let breakdown = CountdownBreakdown {
            days: 0,
            hours: 1,
            minutes: 90,
            seconds: 5,
        };
        assert_eq!(breakdown.total_seconds(), 3_600 + 5_400 + 5);
    }
}
