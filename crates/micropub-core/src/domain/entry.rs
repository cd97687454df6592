use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use url::Url;

use super::{Extension, PostStatus, Rsvp, Visibility};

/// Instant with the offset the client supplied it in.
pub type Timestamp = DateTime<FixedOffset>;

/// Current time as a [`Timestamp`] in UTC.
pub fn now() -> Timestamp {
    Utc::now().fixed_offset()
}

/// Entry - a single microformats2 post.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entry {
    /// Microformats type without the `h-` prefix. Empty means `entry`.
    pub kind: String,
    pub url: Option<Url>,
    pub uid: String,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub published_at: Option<Timestamp>,
    /// Set while the entry is soft-deleted.
    pub deleted_at: Option<Timestamp>,
    pub title: String,
    pub description: String,
    pub content: Vec<u8>,
    pub tags: Vec<String>,
    pub photos: Vec<Url>,
    pub videos: Vec<Url>,
    pub audio: Vec<Url>,
    pub syndications: Vec<Url>,
    pub in_reply_to: Vec<Url>,
    pub rsvp: Rsvp,
    pub visibility: Visibility,
    pub post_status: PostStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub extensions: BTreeMap<String, Extension>,
}

impl Entry {
    /// Create an empty entry of the given microformats type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Microformats type name, e.g. `h-entry`.
    pub fn h_type(&self) -> String {
        if self.kind.is_empty() {
            "h-entry".to_string()
        } else {
            format!("h-{}", self.kind)
        }
    }

    /// Repository key of this entry, if it has an identity yet.
    pub fn path(&self) -> Option<String> {
        self.url.as_ref().map(canonical_path)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn content_text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// Reset a property to its empty value.
    pub fn clear_property(&mut self, name: &PropertyName) {
        match name {
            PropertyName::Name => self.title.clear(),
            PropertyName::Summary => self.description.clear(),
            PropertyName::Content => self.content.clear(),
            PropertyName::Published => self.published_at = None,
            PropertyName::Updated => self.updated_at = None,
            PropertyName::Category => self.tags.clear(),
            PropertyName::Photo => self.photos.clear(),
            PropertyName::Video => self.videos.clear(),
            PropertyName::Audio => self.audio.clear(),
            PropertyName::Syndication => self.syndications.clear(),
            PropertyName::InReplyTo => self.in_reply_to.clear(),
            // The identity is kept: an entry is never stored without one.
            PropertyName::Url => {}
            PropertyName::Uid => self.uid.clear(),
            PropertyName::Rsvp => self.rsvp = Rsvp::Undefined,
            PropertyName::Visibility => self.visibility = Visibility::Undefined,
            PropertyName::PostStatus => self.post_status = PostStatus::Undefined,
            PropertyName::Latitude => self.latitude = None,
            PropertyName::Longitude => self.longitude = None,
            PropertyName::Altitude => self.altitude = None,
            PropertyName::Other(key) => {
                self.extensions.remove(key);
            }
        }
    }
}

/// Microformats2 property names with a first-class slot on [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyName {
    Name,
    Summary,
    Content,
    Published,
    Updated,
    Category,
    Photo,
    Video,
    Audio,
    Syndication,
    InReplyTo,
    Url,
    Uid,
    Rsvp,
    Visibility,
    PostStatus,
    Latitude,
    Longitude,
    Altitude,
    Other(String),
}

impl PropertyName {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "name" => PropertyName::Name,
            "summary" => PropertyName::Summary,
            "content" => PropertyName::Content,
            "published" => PropertyName::Published,
            "updated" => PropertyName::Updated,
            "category" => PropertyName::Category,
            "photo" => PropertyName::Photo,
            "video" => PropertyName::Video,
            "audio" => PropertyName::Audio,
            "syndication" => PropertyName::Syndication,
            "in-reply-to" => PropertyName::InReplyTo,
            "url" => PropertyName::Url,
            "uid" => PropertyName::Uid,
            "rsvp" => PropertyName::Rsvp,
            "visibility" => PropertyName::Visibility,
            "post-status" => PropertyName::PostStatus,
            "latitude" => PropertyName::Latitude,
            "longitude" => PropertyName::Longitude,
            "altitude" => PropertyName::Altitude,
            other => PropertyName::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PropertyName::Name => "name",
            PropertyName::Summary => "summary",
            PropertyName::Content => "content",
            PropertyName::Published => "published",
            PropertyName::Updated => "updated",
            PropertyName::Category => "category",
            PropertyName::Photo => "photo",
            PropertyName::Video => "video",
            PropertyName::Audio => "audio",
            PropertyName::Syndication => "syndication",
            PropertyName::InReplyTo => "in-reply-to",
            PropertyName::Url => "url",
            PropertyName::Uid => "uid",
            PropertyName::Rsvp => "rsvp",
            PropertyName::Visibility => "visibility",
            PropertyName::PostStatus => "post-status",
            PropertyName::Latitude => "latitude",
            PropertyName::Longitude => "longitude",
            PropertyName::Altitude => "altitude",
            PropertyName::Other(key) => key,
        }
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository key for an entry URL: lowercased path (plus query) with
/// redundant slashes and dot segments removed.
pub fn canonical_path(url: &Url) -> String {
    let path = clean_path(&url.path().to_lowercase());

    match url.query() {
        Some(query) if !query.is_empty() => format!("{path}?{}", query.to_lowercase()),
        _ => path,
    }
}

/// Lexically clean a slash-separated path. The result is always rooted and
/// never ends with a slash, except for the root itself.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}
