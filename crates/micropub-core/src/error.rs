//! Error types for the entry protocol engine and its collaborators.

use thiserror::Error;

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("entry not found at {0}")]
    NotFound(String),

    #[error("entry already exists at {0}")]
    AlreadyExists(String),

    #[error("storage connection failed: {0}")]
    Connection(String),

    #[error("storage operation failed: {0}")]
    Query(String),
}

/// Media store errors.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media file is empty")]
    Empty,

    #[error("media not found: {0}")]
    NotFound(String),

    #[error("cannot store media: {0}")]
    Storage(String),
}

/// A single wire value that could not be understood.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("cannot parse '{0}' as date-time, expect RFC 3339 or YYYY-MM-DDTHH:MM")]
    DateTime(String),

    #[error("cannot parse '{value}' as URL: {reason}")]
    Url { value: String, reason: String },

    #[error("unsupported action '{0}', expect 'create', 'update', 'delete' or 'undelete'")]
    Action(String),

    #[error("unsupported RSVP '{0}', expect 'interested', 'maybe', 'no' or 'yes'")]
    Rsvp(String),

    #[error("unsupported visibility '{0}', expect 'public', 'unlisted' or 'private'")]
    Visibility(String),

    #[error("unsupported post status '{0}', expect 'draft' or 'published'")]
    PostStatus(String),

    #[error("cannot parse '{0}' as coordinate")]
    Coordinate(String),

    #[error("cannot render HTML content: {0}")]
    Html(String),
}

/// Request body decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON body: {0}")]
    Json(#[source] serde_json::Error),

    #[error("invalid property value: {0}")]
    Property(#[source] serde_json::Error),

    #[error("JSON body must be an object")]
    NotAnObject,

    #[error("malformed form body: {0}")]
    Form(String),

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl DecodeError {
    /// Splits serde_json failures into syntax problems and typed-value problems.
    pub fn from_json(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Data => DecodeError::Property(err),
            Category::Syntax | Category::Eof | Category::Io => DecodeError::Json(err),
        }
    }
}

/// Protocol-level failures, each mapped to one HTTP status.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Validation(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("method {0} is not allowed")]
    MethodNotAllowed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl ProtocolError {
    /// Short machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::Decode(_) | ProtocolError::Validation(_) => "invalid_request",
            ProtocolError::UnsupportedMediaType(_) => "unsupported_media_type",
            ProtocolError::MethodNotAllowed(_) => "method_not_allowed",
            ProtocolError::NotFound(_) => "not_found",
            ProtocolError::Conflict(_) => "conflict",
            ProtocolError::Storage(_) => "server_error",
        }
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ProtocolError::Decode(_) | ProtocolError::Validation(_) => 400,
            ProtocolError::NotFound(_) => 404,
            ProtocolError::MethodNotAllowed(_) => 405,
            ProtocolError::Conflict(_) => 409,
            ProtocolError::UnsupportedMediaType(_) => 415,
            ProtocolError::Storage(_) => 500,
        }
    }
}

impl From<ValueError> for ProtocolError {
    fn from(err: ValueError) -> Self {
        ProtocolError::Decode(DecodeError::Value(err))
    }
}

impl From<RepoError> for ProtocolError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(path) => ProtocolError::NotFound(format!("no entry at {path}")),
            RepoError::AlreadyExists(path) => {
                ProtocolError::Conflict(format!("an entry already exists at {path}"))
            }
            RepoError::Connection(msg) | RepoError::Query(msg) => {
                tracing::error!(error = %msg, "Entry repository failure");
                ProtocolError::Storage(msg)
            }
        }
    }
}

impl From<MediaError> for ProtocolError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Empty => ProtocolError::Validation(err.to_string()),
            MediaError::NotFound(_) => ProtocolError::NotFound(err.to_string()),
            MediaError::Storage(msg) => {
                tracing::error!(error = %msg, "Media store failure");
                ProtocolError::Storage(msg)
            }
        }
    }
}
