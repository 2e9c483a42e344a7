//! Jira date and timestamp wrappers.
//!
//! Jira is inconsistent about timestamp formats across endpoints, so decoding
//! tries a fixed list of formats in order while encoding always produces the
//! canonical `2024-01-15T10:30:00.000+0000` form. An empty string decodes to an
//! unset value, and an unset value encodes as `null`.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, ParseError, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Canonical timestamp format, also the first one tried when decoding.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// UTC formats without an offset, tried after [`TIME_FORMAT`].
const UTC_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.3fZ", "%Y-%m-%dT%H:%M:%SZ"];

/// Calendar date format.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A Jira timestamp that may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Time(Option<DateTime<FixedOffset>>);

impl Time {
    /// Wrap a timestamp.
    pub fn new(value: DateTime<FixedOffset>) -> Self {
        Self(Some(value))
    }

    /// An unset timestamp.
    pub fn unset() -> Self {
        Self(None)
    }

    /// Parse a timestamp using the accepted formats in order.
    ///
    /// Date-only values are taken as midnight UTC. Returns the error of the
    /// last format tried when nothing matches.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.is_empty() {
            return Ok(Self::unset());
        }
        if let Ok(value) = DateTime::parse_from_str(s, TIME_FORMAT) {
            return Ok(Self::new(value));
        }
        for format in UTC_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self::from_naive_utc(naive));
            }
        }
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)?;
        Ok(Self(
            date.and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive).into()),
        ))
    }

    fn from_naive_utc(naive: NaiveDateTime) -> Self {
        Self::new(Utc.from_utc_datetime(&naive).into())
    }

    /// The wrapped timestamp, if set.
    pub fn get(&self) -> Option<DateTime<FixedOffset>> {
        self.0
    }

    /// Check if no timestamp is set.
    pub fn is_unset(&self) -> bool {
        self.0.is_none()
    }
}

impl From<DateTime<FixedOffset>> for Time {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::new(value)
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value.into())
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value.format(TIME_FORMAT)),
            None => Ok(()),
        }
    }
}

impl Serialize for Time {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(_) => serializer.collect_str(self),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => Time::parse(&s).map_err(de::Error::custom),
            None => Ok(Time::unset()),
        }
    }
}

/// A Jira calendar date (`YYYY-MM-DD`) that may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date(Option<NaiveDate>);

impl Date {
    /// Wrap a date.
    pub fn new(value: NaiveDate) -> Self {
        Self(Some(value))
    }

    /// An unset date.
    pub fn unset() -> Self {
        Self(None)
    }

    /// Parse a `YYYY-MM-DD` date. An empty string is unset.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.is_empty() {
            return Ok(Self::unset());
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT).map(Self::new)
    }

    /// The wrapped date, if set.
    pub fn get(&self) -> Option<NaiveDate> {
        self.0
    }

    /// Check if no date is set.
    pub fn is_unset(&self) -> bool {
        self.0.is_none()
    }
}

impl From<NaiveDate> for Date {
    fn from(value: NaiveDate) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value.format(DATE_FORMAT)),
            None => Ok(()),
        }
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(_) => serializer.collect_str(self),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => Date::parse(&s).map_err(de::Error::custom),
            None => Ok(Date::unset()),
        }
    }
}
