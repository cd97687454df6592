//! Flat key/value bodies: URL-encoded forms and multipart text fields.
//!
//! Fields are normalised into a `name -> [values]` map, then pushed through
//! the same typed decoder as JSON bodies.

use std::collections::BTreeMap;

use percent_encoding::percent_decode;

use super::{Commands, Properties, properties::COMMAND_PREFIX};
use crate::error::DecodeError;

/// Keys that are part of the request envelope, never entry properties.
const RESERVED_KEYS: [&str; 3] = ["h", "action", "access_token"];

/// A flat form after key normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    /// Values of the `h` key, e.g. `entry`.
    pub kinds: Vec<String>,
    pub action: Option<String>,
    pub url: Option<String>,
    pub commands: Commands,
    pub properties: BTreeMap<String, Vec<String>>,
}

impl FormFields {
    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// Keys and values must decode to valid UTF-8; nothing is replaced.
    pub fn from_urlencoded(body: &[u8]) -> Result<Self, DecodeError> {
        let pairs = body
            .split(|&b| b == b'&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = match pair.iter().position(|&b| b == b'=') {
                    Some(i) => (&pair[..i], &pair[i + 1..]),
                    None => (pair, &[][..]),
                };
                Ok((decode_component(key)?, decode_component(value)?))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(Self::from_pairs(pairs))
    }

    /// Normalise raw pairs: `key[]` is folded into `key`, and the envelope
    /// keys and `mp-*` commands are taken out of the property map.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut fields = FormFields::default();

        for (key, value) in pairs {
            let key = key.strip_suffix("[]").unwrap_or(&key).to_string();

            match key.as_str() {
                "h" => fields.kinds.push(value),
                "action" => fields.action = Some(value),
                k if RESERVED_KEYS.contains(&k) => {}
                k if k.starts_with(COMMAND_PREFIX) => fields.commands.insert(k, vec![value]),
                k => {
                    if k == "url" && fields.url.is_none() {
                        fields.url = Some(value.clone());
                    }
                    fields.properties.entry(k.to_string()).or_default().push(value);
                }
            }
        }

        fields
    }

    /// Decode the remaining flat map through the typed JSON decoder.
    pub fn decode_properties(&self) -> Result<Properties, DecodeError> {
        let value = serde_json::to_value(&self.properties).map_err(DecodeError::from_json)?;

        serde_json::from_value(value).map_err(DecodeError::from_json)
    }
}

/// `+` is a space; percent escapes must form valid UTF-8.
fn decode_component(raw: &[u8]) -> Result<String, DecodeError> {
    let spaced: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();

    percent_decode(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| DecodeError::Form(e.to_string()))
}
