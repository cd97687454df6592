use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// A micropub action. Absence of the field means `Create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    #[default]
    Undefined,
    Create,
    Update,
    Delete,
    Undelete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Undefined => "und",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Undelete => "undelete",
        }
    }
}

impl FromStr for Action {
    type Err = ValueError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "undelete" => Ok(Action::Undelete),
            _ => Err(ValueError::Action(raw.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Action::Undefined => serializer.serialize_str(""),
            _ => serializer.serialize_str(self.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        super::deserialize_token(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(" Update ".parse::<Action>(), Ok(Action::Update));
        assert_eq!("UNDELETE".parse::<Action>(), Ok(Action::Undelete));
    }

    #[test]
    fn test_unknown_token_is_an_error() {
        assert_eq!(
            "publish".parse::<Action>(),
            Err(ValueError::Action("publish".to_string()))
        );
        assert!(serde_json::from_str::<Action>(r#""publish""#).is_err());
    }
}
