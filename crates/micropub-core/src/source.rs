//! Source response encoder.

use serde::Serialize;

use crate::codec::{Content, Coordinate, DateTimeValue, Figure, Properties, UrlValue};
use crate::domain::{Entry, PropertyName};

/// Properties returned when a source query names none, in output order.
pub const DEFAULT_PROPERTIES: [&str; 8] = [
    "updated",
    "published",
    "photo",
    "syndication",
    "content",
    "category",
    "name",
    "summary",
];

/// Body of a `q=source` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResponse {
    pub properties: Properties,
    #[serde(rename = "type", skip_serializing_if = "Vec::is_empty")]
    pub kind: Vec<String>,
}

impl SourceResponse {
    /// Encode `entry`, restricted to `requested` property names.
    ///
    /// With no names the default set is used and the `type` array is
    /// included; an explicit subset returns only `properties`.
    pub fn from_entry(entry: &Entry, requested: &[String]) -> Self {
        let names: Vec<PropertyName> = if requested.is_empty() {
            DEFAULT_PROPERTIES.iter().map(|n| PropertyName::parse(n)).collect()
        } else {
            requested.iter().map(|n| PropertyName::parse(n)).collect()
        };

        let mut props = Properties::default();
        for name in &names {
            encode_property(entry, name, &mut props);
        }

        let kind = if requested.is_empty() {
            vec![entry.h_type()]
        } else {
            Vec::new()
        };

        Self {
            properties: props,
            kind,
        }
    }
}

fn encode_property(entry: &Entry, name: &PropertyName, props: &mut Properties) {
    match name {
        PropertyName::Updated => props.updated = entry.updated_at.map(DateTimeValue).into_iter().collect(),
        PropertyName::Published => {
            props.published = entry.published_at.map(DateTimeValue).into_iter().collect()
        }
        PropertyName::Photo => props.photo = figures(&entry.photos),
        PropertyName::Video => props.video = figures(&entry.videos),
        PropertyName::Audio => props.audio = figures(&entry.audio),
        PropertyName::Syndication => props.syndication = urls(&entry.syndications),
        PropertyName::InReplyTo => props.in_reply_to = urls(&entry.in_reply_to),
        PropertyName::Content if !entry.content.is_empty() => {
            props.content = vec![Content::plain(entry.content_text())]
        }
        PropertyName::Category => props.category = entry.tags.clone(),
        PropertyName::Name => props.name = text(&entry.title),
        PropertyName::Summary => props.summary = text(&entry.description),
        PropertyName::Uid => props.uid = text(&entry.uid),
        PropertyName::Url => props.url = entry.url.iter().cloned().map(UrlValue).collect(),
        PropertyName::Rsvp if !entry.rsvp.is_undefined() => props.rsvp = vec![entry.rsvp],
        PropertyName::Visibility if !entry.visibility.is_undefined() => {
            props.visibility = vec![entry.visibility]
        }
        PropertyName::PostStatus if !entry.post_status.is_undefined() => {
            props.post_status = vec![entry.post_status]
        }
        PropertyName::Latitude => props.latitude = entry.latitude.map(Coordinate).into_iter().collect(),
        PropertyName::Longitude => {
            props.longitude = entry.longitude.map(Coordinate).into_iter().collect()
        }
        PropertyName::Altitude => props.altitude = entry.altitude.map(Coordinate).into_iter().collect(),
        PropertyName::Other(key) => {
            if let Some(value) = entry.extensions.get(key).filter(|v| !v.is_empty()) {
                props.extensions.insert(key.clone(), value.clone());
            }
        }
        _ => {}
    }
}

fn figures(urls: &[url::Url]) -> Vec<Figure> {
    urls.iter().cloned().map(Figure::new).collect()
}

fn urls(urls: &[url::Url]) -> Vec<UrlValue> {
    urls.iter().cloned().map(UrlValue).collect()
}

fn text(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Extension, Rsvp};
    use crate::merge::{MergeMode, apply};
    use serde_json::json;
    use url::Url;

    fn sample() -> Entry {
        let mut entry = Entry::new("entry");
        entry.url = Some(Url::parse("https://example.com/2024/01/hello").unwrap());
        entry.title = "Hello".into();
        entry.content = b"Hello, world".to_vec();
        entry.tags = vec!["greeting".into()];
        entry.published_at = Some("2017-05-31T12:03:36-07:00".parse().unwrap());
        entry.syndications = vec![Url::parse("https://social.example/1").unwrap()];
        entry.rsvp = Rsvp::Yes;
        entry
            .extensions
            .insert("mood".into(), Extension::Text("happy".into()));
        entry
    }

    #[test]
    fn test_default_set_in_fixed_order() {
        let response = SourceResponse::from_entry(&sample(), &[]);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "type": ["h-entry"],
                "properties": {
                    "published": ["2017-05-31T12:03:36-07:00"],
                    "syndication": ["https://social.example/1"],
                    "content": ["Hello, world"],
                    "category": ["greeting"],
                    "name": ["Hello"]
                }
            })
        );

        let body = serde_json::to_string(&response.properties).unwrap();
        let order: Vec<usize> = ["published", "syndication", "content", "category", "name"]
            .iter()
            .map(|key| body.find(&format!("\"{key}\"")).unwrap())
            .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_requested_subset_has_no_type() {
        let response =
            SourceResponse::from_entry(&sample(), &["rsvp".to_string(), "mood".to_string()]);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"properties": {"rsvp": ["yes"], "mood": "happy"}})
        );
    }

    #[test]
    fn test_unset_values_are_omitted() {
        let response = SourceResponse::from_entry(&Entry::default(), &[]);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"type": ["h-entry"], "properties": {}})
        );
    }

    #[test]
    fn test_encode_then_decode_round_trip() {
        let original = sample();
        let names: Vec<String> = [
            "url", "name", "content", "category", "published", "syndication", "rsvp",
        ]
        .iter()
        .map(|n| n.to_string())
        .collect();

        let wire = serde_json::to_value(SourceResponse::from_entry(&original, &names)).unwrap();
        let props = Properties::from_json(wire["properties"].clone()).unwrap();

        let mut decoded = Entry::new("entry");
        apply(&mut decoded, &props, MergeMode::Add);

        assert_eq!(decoded.url, original.url);
        assert_eq!(decoded.title, original.title);
        assert_eq!(decoded.content, original.content);
        assert_eq!(decoded.tags, original.tags);
        assert_eq!(decoded.published_at, original.published_at);
        assert_eq!(decoded.syndications, original.syndications);
        assert_eq!(decoded.rsvp, original.rsvp);
    }
}
