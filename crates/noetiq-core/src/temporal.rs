//! Human-readable rendering of note edit timestamps.

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};

/// Describe when a note was last edited, relative to `now`.
///
/// Produces `"today"`, `"on March 5"` within the current year, and
/// `"on March 5 of 2024"` otherwise. Both instants are compared in the
/// timezone they carry.
pub fn describe_edit_date<Tz: TimeZone>(edited: &DateTime<Tz>, now: &DateTime<Tz>) -> String {
    let day = edited.date_naive();
    let today = now.date_naive();

    if day == today {
        "today".to_string()
    } else if day.year() == today.year() {
        format!("on {} {}", day.format("%B"), day.day())
    } else {
        format!("on {} {} of {}", day.format("%B"), day.day(), day.year())
    }
}

/// [`describe_edit_date`] against the current local time.
pub fn describe_edit_date_local(edited: DateTime<Utc>) -> String {
    let edited = edited.with_timezone(&Local);
    describe_edit_date(&edited, &Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_same_day_is_today() {
        assert_eq!(
            describe_edit_date(&utc(2025, 3, 5, 1), &utc(2025, 3, 5, 23)),
            "today"
        );
    }

    #[test]
    fn test_same_year_omits_year() {
        assert_eq!(
            describe_edit_date(&utc(2025, 3, 5, 12), &utc(2025, 10, 1, 12)),
            "on March 5"
        );
    }

    #[test]
    fn test_previous_year_includes_year() {
        assert_eq!(
            describe_edit_date(&utc(2024, 12, 31, 12), &utc(2025, 1, 1, 12)),
            "on December 31 of 2024"
        );
    }

    #[test]
    fn test_local_rendering_of_now_is_today() {
        assert_eq!(describe_edit_date_local(Utc::now()), "today");
    }
}
