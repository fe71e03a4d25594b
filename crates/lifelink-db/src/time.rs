use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

/// SQLite `datetime('now')` format. Stored timestamps are always UTC in this
/// form, so lexicographic comparison in SQL matches chronological order.
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn to_db(dt: DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

pub fn now_db() -> String {
    to_db(Utc::now())
}

/// Parse a stored timestamp. Accepts the canonical DB format and RFC 3339 as
/// a fallback; a corrupt value is logged and mapped to the epoch rather than
/// failing the whole row.
pub fn from_db(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, DB_FORMAT)
        .map(|ndt| ndt.and_utc())
        .or_else(|_| s.parse::<DateTime<Utc>>())
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

pub fn date_to_db(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn date_from_db(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|e| {
        warn!("Corrupt date '{}': {}", s, e);
        NaiveDate::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn db_format_round_trip() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(to_db(dt), "2024-01-15 09:30:00");
        assert_eq!(from_db("2024-01-15 09:30:00"), dt);
    }

    #[test]
    fn rfc3339_fallback() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(from_db("2024-01-15T09:30:00Z"), dt);
    }

    #[test]
    fn corrupt_timestamp_maps_to_epoch() {
        assert_eq!(from_db("not-a-date"), DateTime::<Utc>::default());
    }
}
