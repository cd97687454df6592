//! # Micropub Core
//!
//! The entry protocol engine: canonical entry model, property codec,
//! request parsing, update merging and source encoding.
//! This crate performs no I/O of its own; storage and media are reached
//! through the traits in [`ports`].

pub mod codec;
pub mod domain;
pub mod error;
pub mod merge;
pub mod ports;
pub mod request;
pub mod service;
pub mod source;

pub use error::{DecodeError, ProtocolError, RepoError};
pub use request::{Operation, Route};
pub use service::{EntryService, Outcome};
