use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// A record date exactly as the store sent it, along with its parsed calendar date when the text
/// could be understood.
///
/// The store is not trusted to send well-formed dates. A date that cannot be parsed is kept so it
/// can still be displayed, but it never falls inside any period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LedgerDate {
    raw: String,
    parsed: Option<NaiveDate>,
}

impl LedgerDate {
    /// Accepts `YYYY-MM-DD`, optionally followed by a time part (`T...` or ` ...`).
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = parse_date(&raw);
        Self { raw, parsed }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            raw: date.format("%Y-%m-%d").to_string(),
            parsed: Some(date),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.parsed
    }

    pub fn day(&self) -> Option<u32> {
        self.parsed.map(|d| d.day())
    }

    pub fn month(&self) -> Option<u32> {
        self.parsed.map(|d| d.month())
    }

    pub fn year(&self) -> Option<i32> {
        self.parsed.map(|d| d.year())
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

impl From<NaiveDate> for LedgerDate {
    fn from(value: NaiveDate) -> Self {
        LedgerDate::from_date(value)
    }
}

impl Display for LedgerDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for LedgerDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for LedgerDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(LedgerDate::parse(raw.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        let date = LedgerDate::parse("2026-01-05");
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(date.day(), Some(5));
        assert_eq!(date.month(), Some(1));
        assert_eq!(date.year(), Some(2026));
    }

    #[test]
    fn test_parse_with_time() {
        let date = LedgerDate::parse("2026-03-14T10:22:00");
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2026, 3, 14));
        let date = LedgerDate::parse("2026-03-14 10:22:00");
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2026, 3, 14));
    }

    #[test]
    fn test_unparsable_is_kept() {
        let date = LedgerDate::parse("someday");
        assert_eq!(date.date(), None);
        assert_eq!(date.month(), None);
        assert_eq!(date.raw(), "someday");
        assert_eq!(date.to_string(), "someday");
    }

    #[test]
    fn test_impossible_date() {
        assert_eq!(LedgerDate::parse("2026-02-30").date(), None);
    }

    #[test]
    fn test_deserialize_null() {
        let date: LedgerDate = serde_json::from_str("null").unwrap();
        assert_eq!(date.date(), None);
        assert_eq!(date.raw(), "");
    }
}
