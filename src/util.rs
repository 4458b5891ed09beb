use crate::error::{RepgenError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

/// Parses a range bound given as RFC 3339 or `YYYY-MM-DD`. A bare date
/// starts at midnight, or ends at the last second of the day when
/// `end_of_day` is set, so `until: 2024-09-30` still covers the 30th.
pub fn parse_bound(input: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let time = if end_of_day {
            NaiveTime::from_hms_opt(23, 59, 59)
        } else {
            NaiveTime::from_hms_opt(0, 0, 0)
        };
        if let Some(time) = time {
            return Ok(Utc.from_utc_datetime(&date.and_time(time)));
        }
    }

    Err(RepgenError::InvalidDate(format!(
        "'{input}' is neither RFC 3339 nor YYYY-MM-DD"
    )))
}

/// Parses a calendar day; a full timestamp contributes its own date.
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.date_naive())
        .map_err(|_| RepgenError::InvalidDate(format!("'{input}' is not a YYYY-MM-DD day")))
}

/// `Sep 20, 2024`
pub fn day_label(day: NaiveDate) -> String {
    day.format("%b %-d, %Y").to_string()
}
