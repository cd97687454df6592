//! Media stores.

mod memory;

pub use memory::InMemoryMediaStore;
