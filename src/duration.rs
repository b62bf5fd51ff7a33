//! Sleep duration calculation
//!
//! Elapsed hours between a sleep time and a wake time. When the wake time is
//! numerically earlier than the sleep time the session spans midnight and the
//! wake time is taken to fall on the next day. Equal times give zero hours.

use crate::types::{SleepDuration, SleepInterval, TimeOfDay};

/// Calculator for elapsed sleep between two clock times
pub struct DurationCalculator;

impl DurationCalculator {
    /// Compute the sleep duration rounded to the nearest 0.1 hour
    pub fn compute(sleep: TimeOfDay, wake: TimeOfDay) -> SleepDuration {
        SleepInterval::new(sleep, wake).duration()
    }

    /// Unrounded elapsed hours, in [0, 24)
    pub fn raw_hours(sleep: TimeOfDay, wake: TimeOfDay) -> f64 {
        SleepInterval::new(sleep, wake).elapsed_minutes() as f64 / 60.0
    }
}

/// Compute the sleep duration between `sleep` and `wake`.
///
/// Rounding works on exact elapsed minutes, so ties such as 8.25 h round
/// away from zero (8.3) regardless of floating point representation.
pub fn compute_duration(sleep: TimeOfDay, wake: TimeOfDay) -> SleepDuration {
    DurationCalculator::compute(sleep, wake)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn hours(sleep: &str, wake: &str) -> f64 {
        compute_duration(t(sleep), t(wake)).hours()
    }

    #[test]
    fn test_overnight() {
        assert!((hours("23:00", "07:00") - 8.0).abs() < 1e-9);
        assert!((hours("23:15", "06:45") - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_same_day() {
        assert!((hours("13:00", "14:30") - 1.5).abs() < 1e-9);
        assert!((hours("00:00", "23:59") - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_times_is_zero() {
        assert_eq!(compute_duration(t("07:00"), t("07:00")), SleepDuration::ZERO);
        assert_eq!(compute_duration(t("00:00"), t("00:00")), SleepDuration::ZERO);
    }

    #[test]
    fn test_tie_rounds_away_from_zero() {
        // 22:30 -> 06:45 is exactly 8.25 h
        assert!((DurationCalculator::raw_hours(t("22:30"), t("06:45")) - 8.25).abs() < 1e-9);
        assert_eq!(compute_duration(t("22:30"), t("06:45")).tenths(), 83);
    }

    #[test]
    fn test_one_minute_before_sleep_time() {
        // Wake one minute "earlier" than sleep is almost a full day
        let raw = DurationCalculator::raw_hours(t("08:00"), t("07:59"));
        assert!(raw < 24.0);
        assert!((raw - (24.0 - 1.0 / 60.0)).abs() < 1e-9);
        // Rounds up to a full day
        assert_eq!(compute_duration(t("08:00"), t("07:59")).tenths(), 240);
    }

    #[test]
    fn test_matches_decimal_formula_for_all_quarter_hours() {
        let times: Vec<TimeOfDay> = (0..96).map(|q| TimeOfDay::from_minutes(q * 15)).collect();
        for &sleep in &times {
            for &wake in &times {
                let s = sleep.as_decimal_hours();
                let w = wake.as_decimal_hours();
                let raw = if w < s { (24.0 - s) + w } else { w - s };
                assert!((0.0..24.0).contains(&raw));

                let expected = (raw * 10.0).round() / 10.0;
                let got = compute_duration(sleep, wake).hours();
                assert!((got - expected).abs() < 1e-9, "{sleep} -> {wake}: {got} vs {expected}");
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let first = compute_duration(t("21:47"), t("05:13"));
        let second = compute_duration(t("21:47"), t("05:13"));
        assert_eq!(first, second);
    }
}
