//! Calendar month (year + month) used for posting periods and deviation periods.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A calendar month, serialized as `YYYY-MM`.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid year-month '{input}': expected YYYY-MM")]
pub struct ParseYearMonthError {
    input: String,
}

impl YearMonth {
    /// Returns `None` unless `month` is in 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseYearMonthError {
            input: s.to_string(),
        };
        let (y, m) = s.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = y.parse().map_err(|_| err())?;
        let month: u32 = m.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let ym: YearMonth = "2019-03".parse().unwrap();
        assert_eq!(ym.year(), 2019);
        assert_eq!(ym.month(), 3);
        assert_eq!(ym.to_string(), "2019-03");
    }

    #[test]
    fn test_rejects_bad_month() {
        assert!("2019-13".parse::<YearMonth>().is_err());
        assert!("2019".parse::<YearMonth>().is_err());
        assert!("march-2019".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec = YearMonth::new(2018, 12).unwrap();
        let jan = YearMonth::new(2019, 1).unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn test_serde_as_string() {
        let ym = YearMonth::new(2020, 4).unwrap();
        let json = serde_json::to_string(&ym).unwrap();
        assert_eq!(json, "\"2020-04\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym);
    }

    #[test]
    fn test_from_date() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        assert_eq!(YearMonth::from_date(d), YearMonth::new(2020, 1).unwrap());
    }
}
