//! In-process storage

mod memory;

pub use memory::InMemoryRepositoryProvider;
