//! Domain entities - the canonical entry model and its enumerations.

mod action;
mod entry;
mod extension;
mod rsvp;
mod visibility;

use std::str::FromStr;

use serde::{Deserialize, Deserializer};

pub use action::Action;
pub use entry::{Entry, PropertyName, Timestamp, canonical_path, clean_path, now};
pub use extension::Extension;
pub use rsvp::Rsvp;
pub use visibility::{PostStatus, Visibility};

/// Deserialize a string token through its `FromStr` implementation.
fn deserialize_token<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
