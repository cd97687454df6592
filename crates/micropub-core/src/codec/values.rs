//! Typed wire values: URLs, figures, date-times and coordinates.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::domain::Timestamp;
use crate::error::ValueError;

/// Fallback layout used by HTML `datetime-local` inputs.
const LOCAL_DATE_TIME: &str = "%Y-%m-%dT%H:%M";

/// URL-valued property (`u-*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlValue(pub Url);

impl UrlValue {
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        parse_url(raw).map(UrlValue)
    }
}

impl fmt::Display for UrlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for UrlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for UrlValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        UrlValue::parse(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, ValueError> {
    Url::parse(raw.trim()).map_err(|e| ValueError::Url {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// URL with optional alternative text, used by photo, video and audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Figure {
    pub value: Url,
    pub alt: String,
}

impl Figure {
    pub fn new(value: Url) -> Self {
        Self {
            value,
            alt: String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFigure {
    Plain(String),
    Object {
        value: String,
        #[serde(default)]
        alt: String,
    },
}

impl Serialize for Figure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.alt.is_empty() {
            return serializer.serialize_str(self.value.as_str());
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("value", self.value.as_str())?;
        map.serialize_entry("alt", &self.alt)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Figure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (raw, alt) = match RawFigure::deserialize(deserializer)? {
            RawFigure::Plain(value) => (value, String::new()),
            RawFigure::Object { value, alt } => (value, alt),
        };

        let value = parse_url(&raw).map_err(serde::de::Error::custom)?;

        Ok(Figure { value, alt })
    }
}

/// Date-time property (`dt-*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeValue(pub Timestamp);

impl DateTimeValue {
    /// Parse RFC 3339 first, then the zone-less `YYYY-MM-DDTHH:MM` form as UTC.
    pub fn parse(raw: &str) -> Result<Self, ValueError> {
        let raw = raw.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(DateTimeValue(parsed));
        }

        NaiveDateTime::parse_from_str(raw, LOCAL_DATE_TIME)
            .map(|naive| DateTimeValue(naive.and_utc().fixed_offset()))
            .map_err(|_| ValueError::DateTime(raw.to_string()))
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl Serialize for DateTimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for DateTimeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTimeValue::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Geographic coordinate. Form input carries numbers as strings, so both
/// shapes are accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate(pub f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawCoordinate::deserialize(deserializer)? {
            RawCoordinate::Number(n) => Ok(Coordinate(n)),
            RawCoordinate::Text(raw) => raw
                .trim()
                .parse()
                .map(Coordinate)
                .map_err(|_| serde::de::Error::custom(ValueError::Coordinate(raw))),
        }
    }
}
