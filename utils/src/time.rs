//! Time formatting helpers.

use hive_types::time::{SECS_PER_DAY, SECS_PER_WEEK};

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < SECS_PER_DAY {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs < SECS_PER_WEEK {
        format!("{}d {}h", secs / SECS_PER_DAY, (secs % SECS_PER_DAY) / 3600)
    } else {
        format!(
            "{}w {}d",
            secs / SECS_PER_WEEK,
            (secs % SECS_PER_WEEK) / SECS_PER_DAY
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_largest_sensible_unit() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(7_260), "2h 1m");
        assert_eq!(format_duration(SECS_PER_DAY + 3_600), "1d 1h");
        assert_eq!(format_duration(SECS_PER_WEEK), "1w 0d");
        assert_eq!(format_duration(2 * SECS_PER_WEEK + SECS_PER_DAY), "2w 1d");
    }
}
