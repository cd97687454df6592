//! Ports - trait definitions for the collaborators the engine talks to.

mod media;
mod repository;

pub use media::{MediaFile, MediaStore};
pub use repository::{EntryRepository, UpdateFn};
