//! Entry repositories.

mod memory;

pub use memory::InMemoryEntryRepository;
