//! Breaking down a UTC instant into the calendar fields the [`crate::matcher`] consumes.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::matcher::Calendar;

/// Shifts `secs` by `utc_offset_minutes * 60` and decomposes it into calendar fields
/// (§4.3). The nanosecond component is carried through unchanged. Returns `None` if the
/// shifted timestamp falls outside the range chrono can represent.
#[must_use]
pub fn breakdown(secs: i64, nanos: u32, utc_offset_minutes: i32) -> Option<Calendar> {
    let shifted = secs.checked_add(i64::from(utc_offset_minutes) * 60)?;
    let dt: DateTime<Utc> = DateTime::from_timestamp(shifted, 0)?;
    Some(Calendar {
        nanosecond: nanos,
        second: dt.second(),
        minute: dt.minute(),
        hour: dt.hour(),
        day_of_month: dt.day(),
        month: dt.month(),
        day_of_week: dt.weekday().num_days_from_sunday(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn breakdown_applies_offset_before_decomposing() {
        // 2025-02-17T12:30:00Z (Monday)
        let secs = 1_739_794_200;
        let utc = breakdown(secs, 0, 0).unwrap();
        assert_eq!(utc.hour, 12);
        assert_eq!(utc.day_of_week, 1);

        // +60 minutes should roll the hour forward by one.
        let shifted = breakdown(secs, 0, 60).unwrap();
        assert_eq!(shifted.hour, 13);
    }

    #[test]
    fn nanosecond_is_carried_through_unchanged() {
        let cal = breakdown(1_739_794_200, 123_456_789, 0).unwrap();
        assert_eq!(cal.nanosecond, 123_456_789);
    }
}
