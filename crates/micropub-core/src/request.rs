//! Request classification and parsing.
//!
//! [`classify`] picks a decoding route from the HTTP method and content type,
//! then one of the `parse_*` functions turns the buffered body (or query
//! string) into an [`Operation`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::codec::{Commands, FormFields, Properties, UrlValue, parse_url};
use crate::domain::Action;
use crate::error::{DecodeError, ProtocolError};

/// How the request body has to be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Query-string read (`q=source`).
    Source,
    Json,
    Form,
    Multipart,
}

/// Choose the decoding route for a request.
///
/// An empty method is treated like `GET`.
pub fn classify(method: &str, content_type: Option<&str>) -> Result<Route, ProtocolError> {
    match method {
        "" | "GET" => Ok(Route::Source),
        "POST" => {
            let raw = content_type.unwrap_or_default().trim();
            if raw.is_empty() {
                return Err(ProtocolError::UnsupportedMediaType(
                    "missing Content-Type".to_string(),
                ));
            }

            let media: mime::Mime = raw.parse().map_err(|e| {
                ProtocolError::Validation(format!("cannot understand Content-Type '{raw}': {e}"))
            })?;

            let essence = media.essence_str();
            if essence == mime::APPLICATION_JSON.essence_str() {
                Ok(Route::Json)
            } else if essence == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
                Ok(Route::Form)
            } else if essence == mime::MULTIPART_FORM_DATA.essence_str() {
                Ok(Route::Multipart)
            } else {
                Err(ProtocolError::UnsupportedMediaType(essence.to_string()))
            }
        }
        other => Err(ProtocolError::MethodNotAllowed(other.to_string())),
    }
}

/// One logical protocol operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create(CreateRequest),
    Source(SourceRequest),
    Update(UpdateRequest),
    Delete(Url),
    Undelete(Url),
}

impl Operation {
    pub fn action(&self) -> &'static str {
        match self {
            Operation::Create(_) => Action::Create.as_str(),
            Operation::Source(_) => "source",
            Operation::Update(_) => Action::Update.as_str(),
            Operation::Delete(_) => Action::Delete.as_str(),
            Operation::Undelete(_) => Action::Undelete.as_str(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateRequest {
    /// Microformats type without the `h-` prefix.
    pub kind: String,
    pub properties: Properties,
    pub commands: Commands,
    /// File parts still to be handed to the media store.
    pub uploads: Vec<FilePart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRequest {
    pub url: Url,
    /// Requested property names; empty selects the default set.
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub url: Url,
    pub add: Option<Properties>,
    pub replace: Option<Properties>,
    pub delete: Option<DeleteSpec>,
}

/// The `delete` member of an update.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteSpec {
    /// Clear these properties entirely.
    Keys(Vec<String>),
    /// Remove individual values.
    Values(Properties),
}

impl<'de> Deserialize<'de> for DeleteSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(key) => Ok(key),
                    other => Err(D::Error::custom(format!(
                        "delete keys must be strings, got {other}"
                    ))),
                })
                .collect::<Result<_, _>>()
                .map(DeleteSpec::Keys),
            value @ Value::Object(_) => Properties::from_json(value)
                .map(DeleteSpec::Values)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "delete must be a list of properties or a property map, got {other}"
            ))),
        }
    }
}

/// A file part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

/// A fully buffered multipart body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

/// Properties that accept uploaded files.
const UPLOAD_FIELDS: [&str; 3] = ["photo", "video", "audio"];

/// Parse a `q=source` query string.
pub fn parse_source(query: &str) -> Result<Operation, ProtocolError> {
    let mut q = None;
    let mut target = None;
    let mut properties = Vec::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "q" => q = Some(value.into_owned()),
            "url" => target = Some(value.into_owned()),
            "properties" | "properties[]" => properties.push(value.into_owned()),
            _ => {}
        }
    }

    let q = q.ok_or(DecodeError::MissingField("q"))?;
    if !q.eq_ignore_ascii_case("source") {
        return Err(ProtocolError::Validation(format!(
            "'q' query must be 'source', got '{q}'"
        )));
    }

    let url = parse_url(&target.ok_or(DecodeError::MissingField("url"))?)?;

    Ok(Operation::Source(SourceRequest { url, properties }))
}

#[derive(Deserialize)]
struct JsonCreate {
    #[serde(default)]
    action: Option<Action>,
    #[serde(default, rename = "type")]
    kinds: Vec<String>,
    #[serde(default)]
    properties: Properties,
}

#[derive(Deserialize)]
struct JsonUpdate {
    action: Action,
    #[serde(default)]
    url: Option<UrlValue>,
    #[serde(default)]
    add: Option<Properties>,
    #[serde(default)]
    replace: Option<Properties>,
    #[serde(default)]
    delete: Option<DeleteSpec>,
}

#[derive(Deserialize)]
struct JsonTarget {
    action: Action,
    #[serde(default)]
    url: Option<UrlValue>,
}

/// Parse a JSON body.
pub fn parse_json(body: &[u8]) -> Result<Operation, ProtocolError> {
    let envelope: Value = serde_json::from_slice(body).map_err(DecodeError::from_json)?;
    let Value::Object(envelope) = envelope else {
        return Err(DecodeError::NotAnObject.into());
    };

    let declared = match envelope.get("action") {
        Some(Value::String(action)) => action.parse().unwrap_or(Action::Undefined),
        _ => Action::Undefined,
    };
    debug!(action = %declared, "Dispatching JSON request");

    match declared {
        Action::Update => {
            let request: JsonUpdate = decode(body)?;
            expect_action(request.action, Action::Update)?;

            let mut add = request.add;
            let mut replace = request.replace;
            for props in [add.as_mut(), replace.as_mut()].into_iter().flatten() {
                let commands = props.take_commands();
                if !commands.is_empty() {
                    debug!(commands = ?commands.keys().collect::<Vec<_>>(), "Ignoring commands in update");
                }
            }

            Ok(Operation::Update(UpdateRequest {
                url: required_url(request.url)?,
                add,
                replace,
                delete: request.delete,
            }))
        }
        Action::Delete | Action::Undelete => {
            let request: JsonTarget = decode(body)?;
            expect_action(request.action, declared)?;

            let url = required_url(request.url)?;
            Ok(match declared {
                Action::Delete => Operation::Delete(url),
                _ => Operation::Undelete(url),
            })
        }
        Action::Undefined | Action::Create => {
            let mut request: JsonCreate = decode(body)?;
            if let Some(action) = request.action {
                expect_action(action, Action::Create)?;
            }

            let commands = request.properties.take_commands();

            Ok(Operation::Create(CreateRequest {
                kind: kind_of(request.kinds.first().map(String::as_str)),
                properties: request.properties,
                commands,
                uploads: Vec::new(),
            }))
        }
    }
}

/// Parse an `application/x-www-form-urlencoded` body.
pub fn parse_form(body: &[u8]) -> Result<Operation, ProtocolError> {
    let fields = FormFields::from_urlencoded(body)?;

    let action = fields
        .action
        .as_deref()
        .map(|action| action.trim().to_ascii_lowercase())
        .unwrap_or_default();
    debug!(action = %action, "Dispatching form request");

    match action.as_str() {
        "delete" => Ok(Operation::Delete(form_url(&fields)?)),
        "undelete" => Ok(Operation::Undelete(form_url(&fields)?)),
        _ => form_create(fields, Vec::new()),
    }
}

/// Parse a buffered multipart body. Multipart is always a create.
pub fn parse_multipart(payload: MultipartPayload) -> Result<Operation, ProtocolError> {
    let fields = FormFields::from_pairs(payload.fields);

    let mut uploads = Vec::with_capacity(payload.files.len());
    for mut file in payload.files {
        let field = file.field.strip_suffix("[]").unwrap_or(&file.field).to_string();
        if !UPLOAD_FIELDS.contains(&field.as_str()) {
            debug!(field = %file.field, "Skipping file part for unsupported property");
            continue;
        }

        file.field = field;
        uploads.push(file);
    }

    form_create(fields, uploads)
}

fn form_create(fields: FormFields, uploads: Vec<FilePart>) -> Result<Operation, ProtocolError> {
    let properties = fields.decode_properties()?;

    Ok(Operation::Create(CreateRequest {
        kind: kind_of(fields.kinds.first().map(String::as_str)),
        properties,
        commands: fields.commands,
        uploads,
    }))
}

fn form_url(fields: &FormFields) -> Result<Url, ProtocolError> {
    let raw = fields
        .url
        .as_deref()
        .ok_or(DecodeError::MissingField("url"))?;

    Ok(parse_url(raw)?)
}

fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(body)
        .map_err(DecodeError::from_json)
        .map_err(ProtocolError::from)
}

fn expect_action(got: Action, want: Action) -> Result<(), ProtocolError> {
    if got == want {
        return Ok(());
    }

    Err(ProtocolError::Validation(format!(
        "invalid action, got '{got}', want '{want}'"
    )))
}

fn required_url(url: Option<UrlValue>) -> Result<Url, ProtocolError> {
    url.map(|url| url.0)
        .ok_or_else(|| DecodeError::MissingField("url").into())
}

/// `h-entry`, `entry` and `Entry` all name the same type.
fn kind_of(raw: Option<&str>) -> String {
    let raw = raw.unwrap_or_default().trim().to_ascii_lowercase();

    match raw.strip_prefix("h-") {
        Some(kind) => kind.to_string(),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_dispatch_table() {
        assert_eq!(classify("", None).unwrap(), Route::Source);
        assert_eq!(classify("GET", Some("text/html")).unwrap(), Route::Source);
        assert_eq!(
            classify("POST", Some("application/json; charset=utf-8")).unwrap(),
            Route::Json
        );
        assert_eq!(
            classify("POST", Some("application/x-www-form-urlencoded")).unwrap(),
            Route::Form
        );
        assert_eq!(
            classify("POST", Some("multipart/form-data; boundary=xyz")).unwrap(),
            Route::Multipart
        );

        assert_eq!(classify("POST", Some("text/plain")).unwrap_err().status(), 415);
        assert_eq!(classify("POST", None).unwrap_err().status(), 415);
        assert_eq!(classify("POST", Some("???")).unwrap_err().status(), 400);
        assert_eq!(classify("PUT", Some("application/json")).unwrap_err().status(), 405);
    }

    #[test]
    fn test_source_query() {
        let op = parse_source(
            "q=SOURCE&url=https%3A%2F%2Fexample.com%2Fa&properties[]=content&properties=name",
        )
        .unwrap();

        let Operation::Source(request) = op else {
            panic!("expected source, got {op:?}");
        };
        assert_eq!(request.url.as_str(), "https://example.com/a");
        assert_eq!(request.properties, vec!["content", "name"]);
    }

    #[test]
    fn test_source_query_errors() {
        assert!(matches!(
            parse_source("url=https%3A%2F%2Fexample.com%2Fa"),
            Err(ProtocolError::Decode(DecodeError::MissingField("q")))
        ));
        assert!(matches!(
            parse_source("q=config&url=https%3A%2F%2Fexample.com%2Fa"),
            Err(ProtocolError::Validation(_))
        ));
        assert!(matches!(
            parse_source("q=source"),
            Err(ProtocolError::Decode(DecodeError::MissingField("url")))
        ));
    }

    #[test]
    fn test_json_without_action_is_create() {
        let op = parse_json(
            br#"{"type":["h-entry"],"properties":{"content":["hello"],"mp-slug":["hi"]}}"#,
        )
        .unwrap();

        let Operation::Create(request) = op else {
            panic!("expected create, got {op:?}");
        };
        assert_eq!(request.kind, "entry");
        assert_eq!(request.properties.content[0].text(), "hello");
        assert_eq!(request.commands.slug(), Some("hi"));
        assert!(request.properties.extensions.is_empty());
    }

    #[test]
    fn test_json_body_must_be_an_object() {
        for body in ["[]", "[{}]", "\"h-entry\"", "null", "42"] {
            assert!(matches!(
                parse_json(body.as_bytes()),
                Err(ProtocolError::Decode(DecodeError::NotAnObject))
            ));
        }
    }

    #[test]
    fn test_json_unknown_action_fails_create_decode() {
        let err = parse_json(br#"{"action":"publish","properties":{}}"#).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_json_update() {
        let op = parse_json(
            br#"{
                "action": "update",
                "url": "https://example.com/post",
                "add": {"category": ["b"]},
                "replace": {"category": ["c"]},
                "delete": ["content"]
            }"#,
        )
        .unwrap();

        let Operation::Update(request) = op else {
            panic!("expected update, got {op:?}");
        };
        assert_eq!(request.add.unwrap().category, vec!["b"]);
        assert_eq!(request.replace.unwrap().category, vec!["c"]);
        assert_eq!(request.delete, Some(DeleteSpec::Keys(vec!["content".into()])));
    }

    #[test]
    fn test_json_update_delete_values() {
        let op = parse_json(
            br#"{"action":"update","url":"https://example.com/post","delete":{"category":["a"]}}"#,
        )
        .unwrap();

        let Operation::Update(UpdateRequest {
            delete: Some(DeleteSpec::Values(values)),
            ..
        }) = op
        else {
            panic!("expected value deletion, got {op:?}");
        };
        assert_eq!(values.category, vec!["a"]);
    }

    #[test]
    fn test_json_update_requires_url() {
        assert!(matches!(
            parse_json(br#"{"action":"update"}"#),
            Err(ProtocolError::Decode(DecodeError::MissingField("url")))
        ));
    }

    #[test]
    fn test_json_delete_and_undelete() {
        let delete = parse_json(br#"{"action":"delete","url":"https://example.com/a"}"#).unwrap();
        assert!(matches!(delete, Operation::Delete(_)));

        let undelete =
            parse_json(br#"{"action":"UNDELETE","url":"https://example.com/a"}"#).unwrap();
        assert!(matches!(undelete, Operation::Undelete(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse_json(b"{\"action\":"),
            Err(ProtocolError::Decode(DecodeError::Json(_)))
        ));
    }

    #[test]
    fn test_form_actions() {
        let delete = parse_form(b"action=Delete&url=https%3A%2F%2Fexample.com%2Fa").unwrap();
        assert_eq!(delete, Operation::Delete(Url::parse("https://example.com/a").unwrap()));

        assert!(matches!(
            parse_form(b"action=undelete"),
            Err(ProtocolError::Decode(DecodeError::MissingField("url")))
        ));

        let create = parse_form(b"h=entry&action=anything&content=hi").unwrap();
        assert!(matches!(create, Operation::Create(_)));
    }

    #[test]
    fn test_multipart_keeps_only_media_files() {
        let payload = MultipartPayload {
            fields: vec![
                ("h".into(), "entry".into()),
                ("content".into(), "with photo".into()),
            ],
            files: vec![
                FilePart {
                    field: "photo[]".into(),
                    filename: "sunset.jpg".into(),
                    content_type: Some("image/jpeg".into()),
                    content: vec![1, 2, 3],
                },
                FilePart {
                    field: "attachment".into(),
                    filename: "notes.txt".into(),
                    content_type: None,
                    content: vec![4],
                },
            ],
        };

        let Operation::Create(request) = parse_multipart(payload).unwrap() else {
            panic!("multipart must create");
        };
        assert_eq!(request.uploads.len(), 1);
        assert_eq!(request.uploads[0].field, "photo");
        assert_eq!(request.properties.content[0].text(), "with photo");
    }

    #[test]
    fn test_json_and_form_create_are_equivalent() {
        let json = parse_json(
            br#"{"type":["h-entry"],"properties":{"content":["hello"],"category":["x","y"]}}"#,
        )
        .unwrap();
        let form = parse_form(b"h=entry&content=hello&category[]=x&category[]=y").unwrap();

        assert_eq!(json, form);
    }
}
