//! `e-content` values: plain text or an HTML fragment.

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, QualName, local_name, namespace_url, ns, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// HTML fragment normalised by a fragment parse in a `<body>` context.
///
/// The parser hangs the fragment under a synthetic `<html>` root; only its
/// children are kept, so head-only tags such as `<title>` stay in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFragment(String);

impl HtmlFragment {
    pub fn parse(markup: &str) -> Result<Self, ValueError> {
        let context = QualName::new(None, ns!(html), local_name!("body"));
        let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
            .one(markup);

        let root = find_element(&dom.document, "html")
            .ok_or_else(|| ValueError::Html("parsed fragment has no root".to_string()))?;

        let mut rendered = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        serialize(&mut rendered, &SerializableHandle::from(root), opts)
            .map_err(|e| ValueError::Html(e.to_string()))?;

        String::from_utf8(rendered)
            .map(HtmlFragment)
            .map_err(|e| ValueError::Html(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = handle.data {
        if &*name.local == tag {
            return Some(handle.clone());
        }
    }

    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

/// Body text of an entry. When `html` is present it wins over `value`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Content {
    pub value: String,
    pub html: Option<HtmlFragment>,
}

impl Content {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            html: None,
        }
    }

    pub fn html(markup: &str) -> Result<Self, ValueError> {
        Ok(Self {
            value: String::new(),
            html: Some(HtmlFragment::parse(markup)?),
        })
    }

    /// Resolved content as stored on the entry.
    pub fn text(&self) -> &str {
        match &self.html {
            Some(html) => html.as_str(),
            None => &self.value,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Plain(String),
    Object {
        #[serde(default)]
        html: String,
        #[serde(default)]
        value: String,
    },
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.html {
            Some(html) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("html", html.as_str())?;
                map.end()
            }
            None => serializer.serialize_str(&self.value),
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawContent::deserialize(deserializer)? {
            RawContent::Plain(value) => Ok(Content::plain(value)),
            RawContent::Object { html, value } if html.is_empty() => Ok(Content::plain(value)),
            RawContent::Object { html, value } => {
                let html = HtmlFragment::parse(&html).map_err(serde::de::Error::custom)?;
                Ok(Content {
                    value,
                    html: Some(html),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_round_trip_has_no_wrapper() {
        let content: Content = serde_json::from_str(r#"{"html":"<b>Hi</b>"}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&content).unwrap(),
            r#"{"html":"<b>Hi</b>"}"#
        );
    }

    #[test]
    fn test_plain_content() {
        let content: Content = serde_json::from_str(r#""Hello World""#).unwrap();
        assert_eq!(content, Content::plain("Hello World"));
        assert_eq!(serde_json::to_string(&content).unwrap(), r#""Hello World""#);
    }

    #[test]
    fn test_html_wins_over_value() {
        let content = Content {
            value: "Hello World".into(),
            html: Some(HtmlFragment::parse("<b>Hello</b> <i>World</i>").unwrap()),
        };
        assert_eq!(
            serde_json::to_string(&content).unwrap(),
            r#"{"html":"<b>Hello</b> <i>World</i>"}"#
        );
        assert_eq!(content.text(), "<b>Hello</b> <i>World</i>");
    }

    #[test]
    fn test_head_only_tags_are_kept() {
        let fragment = HtmlFragment::parse("<title>x</title><b>Hi</b>").unwrap();
        assert_eq!(fragment.as_str(), "<title>x</title><b>Hi</b>");
    }

    #[test]
    fn test_paragraph_markup_is_preserved() {
        let markup = "<p>This post has <b>bold</b> and <i>italic</i> text.</p>";
        assert_eq!(HtmlFragment::parse(markup).unwrap().as_str(), markup);
    }
}
