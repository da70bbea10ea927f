//! Date and time primitives.
//!
//! The remote store returns partial precision (`2023`, `2023-04`, full
//! instants) so the raw string is kept as sent and parsed on demand.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// FHIR `dateTime` / `instant`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FhirDateTime(pub String);

impl FhirDateTime {
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Parse to UTC, accepting any FHIR precision. Partial dates resolve to
    /// their first instant.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        parse_lenient(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<DateTime<Utc>> for FhirDateTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl fmt::Display for FhirDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// FHIR `date`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FhirDate(pub String);

impl FhirDate {
    pub fn as_naive(&self) -> Option<NaiveDate> {
        parse_lenient(&self.0).map(|dt| dt.date_naive())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<NaiveDate> for FhirDate {
    fn from(value: NaiveDate) -> Self {
        Self(value.format("%Y-%m-%d").to_string())
    }
}

impl fmt::Display for FhirDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a FHIR date, dateTime or instant string to UTC.
pub fn parse_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    let date = match raw.len() {
        10 => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok(),
        4 => NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d").ok(),
        _ => None,
    }?;
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_all_precisions() {
        let expect = |y, m, d, h| Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap();

        assert_eq!(parse_lenient("2023"), Some(expect(2023, 1, 1, 0)));
        assert_eq!(parse_lenient("2023-04"), Some(expect(2023, 4, 1, 0)));
        assert_eq!(parse_lenient("2023-04-05"), Some(expect(2023, 4, 5, 0)));
        assert_eq!(
            parse_lenient("2023-04-05T10:00:00+03:00"),
            Some(expect(2023, 4, 5, 7))
        );
        assert_eq!(parse_lenient("2023-04-05T10:00:00"), Some(expect(2023, 4, 5, 10)));
        assert_eq!(parse_lenient("yesterday"), None);
    }

    #[test]
    fn test_transparent_serde() {
        let dt: FhirDateTime = serde_json::from_str("\"2024-01-02T03:04:05Z\"").unwrap();
        assert_eq!(dt.as_str(), "2024-01-02T03:04:05Z");
        assert_eq!(serde_json::to_string(&dt).unwrap(), "\"2024-01-02T03:04:05Z\"");
    }
}
