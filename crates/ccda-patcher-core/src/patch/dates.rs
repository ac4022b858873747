//! Date handling for document timestamps.

use chrono::NaiveDate;

/// Normalize a document timestamp to a calendar date.
///
/// Accepts ISO-8601 (`2022-03-07T00:00:00-08:00`, `2022-03-07`) and HL7 TS
/// (`20220307000000-0800`, `20220307`). Time of day and zone offset are discarded, so the
/// result is the date as written, not converted to UTC.
pub fn normalize_visit_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if raw.as_bytes().get(4) == Some(&b'-') {
        return NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok();
    }

    let digits = raw.get(..8)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

/// Format a date as an HL7 TS date (`YYYYMMDD`).
pub fn hl7_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_iso_timestamp_keeps_local_date() {
        assert_eq!(normalize_visit_date("2022-03-07T00:00:00-08:00"), ymd(2022, 3, 7));
        assert_eq!(normalize_visit_date("2022-03-07T23:59:00+14:00"), ymd(2022, 3, 7));
        assert_eq!(normalize_visit_date("2022-03-07"), ymd(2022, 3, 7));
    }

    #[test]
    fn test_hl7_timestamp() {
        assert_eq!(normalize_visit_date("20220307000000-0800"), ymd(2022, 3, 7));
        assert_eq!(normalize_visit_date("20220307"), ymd(2022, 3, 7));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize_visit_date("Invalid date"), None);
        assert_eq!(normalize_visit_date("2022"), None);
        assert_eq!(normalize_visit_date("2022-13-40"), None);
        assert_eq!(normalize_visit_date(""), None);
    }

    #[test]
    fn test_hl7_date_format() {
        assert_eq!(hl7_date(NaiveDate::from_ymd_opt(2022, 3, 1).unwrap()), "20220301");
    }
}
