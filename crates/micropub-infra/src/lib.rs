//! # Micropub Infrastructure
//!
//! Concrete implementations of the ports defined in `micropub-core`.
//! Everything here is in-memory; data does not survive a restart.

pub mod entries;
pub mod media;

pub use entries::InMemoryEntryRepository;
pub use media::InMemoryMediaStore;
