//! The microformats2 properties bag shared by every wire encoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Content, Coordinate, DateTimeValue, Figure, UrlValue};
use crate::domain::{Extension, PostStatus, Rsvp, Visibility};

/// Vendor command prefix (`mp-slug`, `mp-syndicate-to`, ...).
pub const COMMAND_PREFIX: &str = "mp-";

/// Mapping from property name to an ordered list of typed values.
///
/// Field order is the order of the default Source response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<DateTimeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub published: Vec<DateTimeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<Figure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syndication: Vec<UrlValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<UrlValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uid: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub video: Vec<Figure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio: Vec<Figure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_reply_to: Vec<UrlValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rsvp: Vec<Rsvp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visibility: Vec<Visibility>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_status: Vec<PostStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub latitude: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub longitude: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub altitude: Vec<Coordinate>,
    /// Everything without a typed slot.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Extension>,
}

impl Properties {
    /// Decode a JSON `properties` object.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Move `mp-*` keys out of the bag.
    pub fn take_commands(&mut self) -> Commands {
        let keys: Vec<String> = self
            .extensions
            .keys()
            .filter(|key| key.starts_with(COMMAND_PREFIX))
            .cloned()
            .collect();

        let mut commands = Commands::default();
        for key in keys {
            if let Some(value) = self.extensions.remove(&key) {
                commands.insert(key, value.texts());
            }
        }

        commands
    }
}

/// Server commands sent alongside properties (`mp-*` keys).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Commands(BTreeMap<String, Vec<String>>);

impl Commands {
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.0.entry(key.into()).or_default().extend(values);
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Requested slug for a new entry, if any.
    pub fn slug(&self) -> Option<&str> {
        self.get("mp-slug")
            .and_then(|values| values.first())
            .map(|slug| slug.trim())
            .filter(|slug| !slug.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
