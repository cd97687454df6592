use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// Reply status to an event invitation (`p-rsvp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rsvp {
    #[default]
    Undefined,
    Interested,
    Maybe,
    No,
    Yes,
}

impl Rsvp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rsvp::Undefined => "und",
            Rsvp::Interested => "interested",
            Rsvp::Maybe => "maybe",
            Rsvp::No => "no",
            Rsvp::Yes => "yes",
        }
    }

    pub fn is_undefined(&self) -> bool {
        *self == Rsvp::Undefined
    }
}

impl FromStr for Rsvp {
    type Err = ValueError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "interested" => Ok(Rsvp::Interested),
            "maybe" => Ok(Rsvp::Maybe),
            "no" => Ok(Rsvp::No),
            "yes" => Ok(Rsvp::Yes),
            _ => Err(ValueError::Rsvp(raw.to_string())),
        }
    }
}

impl fmt::Display for Rsvp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Rsvp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Rsvp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        super::deserialize_token(deserializer)
    }
}
