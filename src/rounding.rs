/// Time to log for one entry, with both durations rendered for the audit report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundedDuration {
    pub seconds: u64,
    pub original: String,
    pub rounded: String,
}

pub fn round_duration(elapsed_seconds: u64, precision_minutes: u32) -> RoundedDuration {
    let seconds = round_seconds(elapsed_seconds, precision_minutes);
    RoundedDuration {
        seconds,
        original: format_duration(elapsed_seconds),
        rounded: format_duration(seconds),
    }
}

/// Rounds to the closest multiple of the precision, exact halves going up.
/// A result of zero is lifted to one full bucket.
pub fn round_seconds(seconds: u64, precision_minutes: u32) -> u64 {
    let increment_seconds = u64::from(precision_minutes) * 60;
    if increment_seconds == 0 {
        return seconds;
    }

    let lower = (seconds / increment_seconds) * increment_seconds;
    let distance_to_lower = seconds - lower;
    let rounded = if distance_to_lower == 0 {
        lower
    } else {
        let distance_to_upper = increment_seconds - distance_to_lower;
        if distance_to_upper <= distance_to_lower {
            lower.saturating_add(increment_seconds)
        } else {
            lower
        }
    };

    if rounded == 0 {
        increment_seconds
    } else {
        rounded
    }
}

/// Renders seconds as `1h2m3s`, `16m0s` or `20s`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h{minutes}m{secs}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_duration_one_minute_keeps_value() {
        let rounded = round_duration(960, 1);
        assert_eq!(rounded.seconds, 960);
        assert_eq!(rounded.original, "16m0s");
        assert_eq!(rounded.rounded, "16m0s");
    }

    #[test]
    fn round_duration_quarter_hour() {
        let rounded = round_duration(960, 15);
        assert_eq!(rounded.seconds, 900);
        assert_eq!(rounded.original, "16m0s");
        assert_eq!(rounded.rounded, "15m0s");
    }

    #[test]
    fn round_seconds_short_work_becomes_one_bucket() {
        let rounded = round_duration(120, 15);
        assert_eq!(rounded.seconds, 900);
        assert_eq!(rounded.original, "2m0s");
        assert_eq!(rounded.rounded, "15m0s");
        assert_eq!(round_seconds(0, 15), 900);
    }

    #[test]
    fn round_seconds_closest_ties_up() {
        assert_eq!(round_seconds(1349, 15), 900);
        assert_eq!(round_seconds(1350, 15), 1800);
        assert_eq!(round_duration(1349, 15).original, "22m29s");
        assert_eq!(round_duration(1350, 15).rounded, "30m0s");
    }

    #[test]
    fn round_seconds_zero_precision_returns_raw() {
        assert_eq!(round_seconds(123, 0), 123);
    }

    #[test]
    fn format_duration_matches_report_style() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(20), "20s");
        assert_eq!(format_duration(250), "4m10s");
        assert_eq!(format_duration(3600), "1h0m0s");
        assert_eq!(format_duration(8 * 3600 + 7 * 60), "8h7m0s");
    }

    proptest! {
        #[test]
        fn rounded_is_nonzero_multiple_of_bucket(elapsed in 0u64..1_000_000, precision in 1u32..240) {
            let rounded = round_seconds(elapsed, precision);
            let bucket = u64::from(precision) * 60;
            prop_assert_eq!(rounded % bucket, 0);
            prop_assert!(rounded > 0);
        }

        #[test]
        fn rounding_is_idempotent(elapsed in 0u64..1_000_000, precision in 1u32..240) {
            let once = round_seconds(elapsed, precision);
            prop_assert_eq!(round_seconds(once, precision), once);
        }

        #[test]
        fn rounded_stays_within_half_bucket(elapsed in 1u64..1_000_000, precision in 1u32..240) {
            let rounded = round_seconds(elapsed, precision);
            let bucket = u64::from(precision) * 60;
            if elapsed * 2 >= bucket {
                prop_assert!(rounded.abs_diff(elapsed) * 2 <= bucket);
            } else {
                prop_assert_eq!(rounded, bucket);
            }
        }
    }
}
