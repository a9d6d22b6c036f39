use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// Whitespace is allowed around separators: text nodes of inline markup such as
// `<b>01</b>/15/2024` are joined with a space.
static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s*/\s*(\d{1,2})\s*/\s*(\d{4})\b").unwrap());

const TIME_RANGE_PATTERN: &str =
    r"(\d{1,2})\s*:\s*(\d{2})\s*([ap]m)\s*[-\x{2013}\x{2014}]\s*(\d{1,2})\s*:\s*(\d{2})\s*([ap]m)";

static TIME_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{TIME_RANGE_PATTERN}\b")).unwrap());

static TIME_RANGE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^\s*{TIME_RANGE_PATTERN}\s*$")).unwrap());

/// A calendar date with a start and end wall-clock time, not yet bound to a
/// timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    /// Interprets the wall-clock times in `tz`.
    ///
    /// Ambiguous local times resolve to the earlier instant; local times that
    /// fall into a DST gap do not exist and yield `None`.
    pub fn resolve(&self, tz: Tz) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
        let start = tz.from_local_datetime(&self.date.and_time(self.start)).earliest()?;
        let end = tz.from_local_datetime(&self.date.and_time(self.end)).earliest()?;
        Some((start, end))
    }
}

/// Date token from `date_field`, time range from `time_field` or, failing
/// that, from `date_field` itself.
pub fn strict(date_field: &str, time_field: &str) -> Option<Slot> {
    let date = find_date(date_field)?;
    let (start, end) = find_time_range(time_field).or_else(|| find_time_range(date_field))?;
    Some(Slot { date, start, end })
}

/// Date and time range found anywhere in one blob of text.
pub fn loose(text: &str) -> Option<Slot> {
    let date = find_date(text)?;
    let (start, end) = find_time_range(text)?;
    Some(Slot { date, start, end })
}

pub fn contains_date(text: &str) -> bool {
    DATE.is_match(text)
}

/// Whether `text` holds a time range and nothing else.
pub fn is_time_range_line(text: &str) -> bool {
    TIME_RANGE_LINE.is_match(text)
}

/// Parses a complete `MM/DD/YYYY` string; padding is optional.
pub fn parse_us_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let captures = DATE.captures(text)?;
    if captures.get(0)?.as_str().len() != text.len() {
        return None;
    }
    date_from_captures(&captures)
}

pub fn format_us_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

fn find_date(text: &str) -> Option<NaiveDate> {
    date_from_captures(&DATE.captures(text)?)
}

fn date_from_captures(captures: &Captures) -> Option<NaiveDate> {
    let month = captures[1].parse().ok()?;
    let day = captures[2].parse().ok()?;
    let year = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn find_time_range(text: &str) -> Option<(NaiveTime, NaiveTime)> {
    let captures = TIME_RANGE.captures(text)?;
    let start = clock_time(&captures[1], &captures[2], &captures[3])?;
    let end = clock_time(&captures[4], &captures[5], &captures[6])?;
    Some((start, end))
}

fn clock_time(hour: &str, minute: &str, meridiem: &str) -> Option<NaiveTime> {
    let hour = hour.parse::<u32>().ok()?;
    let minute = minute.parse::<u32>().ok()?;

    if !(1..=12).contains(&hour) {
        return None;
    }

    let offset = if meridiem.eq_ignore_ascii_case("pm") { 12 } else { 0 };
    NaiveTime::from_hms_opt(hour % 12 + offset, minute, 0)
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use chrono_tz::America::Chicago;

    use super::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn strict_round_trip() {
        let slot = strict("01/15/2024", "10:00 AM - 11:30 AM").unwrap();
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(slot.start, hm(10, 0));
        assert_eq!(slot.end, hm(11, 30));

        let (start, end) = slot.resolve(Chicago).unwrap();
        assert_eq!((start.hour(), start.minute()), (10, 0));
        assert_eq!((end.hour(), end.minute()), (11, 30));
        assert_eq!(start.date_naive(), slot.date);
    }

    #[test]
    fn missing_meridiem_is_rejected() {
        assert_eq!(strict("01/15/2024", "10:00 - 11:30"), None);
        assert_eq!(loose("01/15/2024 10:00 - 11:30"), None);
    }

    #[test]
    fn time_range_may_share_the_date_field() {
        let slot = strict("Fri 1/5/2024 6:15pm \u{2013} 7:00pm", "").unwrap();
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(slot.start, hm(18, 15));
        assert_eq!(slot.end, hm(19, 0));
    }

    #[test]
    fn noon_and_midnight() {
        let slot = loose("02/01/2024 12:00 AM \u{2014} 12:30 PM").unwrap();
        assert_eq!(slot.start, hm(0, 0));
        assert_eq!(slot.end, hm(12, 30));
    }

    #[test]
    fn invalid_components() {
        assert_eq!(loose("13/01/2024 9:00 AM - 10:00 AM"), None);
        assert_eq!(loose("02/30/2024 9:00 AM - 10:00 AM"), None);
        assert_eq!(loose("02/01/2024 0:30 AM - 10:00 AM"), None);
        assert_eq!(loose("02/01/2024 9:75 AM - 10:00 AM"), None);
        assert_eq!(loose("9:00 AM - 10:00 AM"), None);
    }

    #[test]
    fn tokens_split_by_inline_markup() {
        let slot = strict("01 /15/2024", "10: 00 AM - 11:30 AM").unwrap();
        assert_eq!(slot.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(slot.start, hm(10, 0));
        assert_eq!(slot.end, hm(11, 30));
    }

    #[test]
    fn time_range_lines() {
        assert!(is_time_range_line(" 9:00 AM - 10:00 AM "));
        assert!(!is_time_range_line("Open Gym 02/01/2024 9:00 AM - 10:00 AM"));
        assert!(!is_time_range_line("Open Gym"));
    }

    #[test]
    fn dst_gap_does_not_resolve() {
        let slot = loose("03/10/2024 2:30 AM - 3:30 AM").unwrap();
        assert_eq!(slot.resolve(Chicago), None);
    }

    #[test]
    fn us_date_strings() {
        assert_eq!(parse_us_date(" 2/1/2024 "), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(parse_us_date("02/01/2024x"), None);
        assert_eq!(parse_us_date("2024-02-01"), None);
        assert_eq!(format_us_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()), "02/01/2024");
    }
}
