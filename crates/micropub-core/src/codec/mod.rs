//! Property codec - maps JSON, URL-encoded and multipart property bags onto
//! typed values and back.

mod content;
pub mod form;
mod properties;
mod values;

pub use content::{Content, HtmlFragment};
pub use form::FormFields;
pub use properties::{COMMAND_PREFIX, Commands, Properties};
pub use values::{Coordinate, DateTimeValue, Figure, UrlValue};
pub(crate) use values::parse_url;
