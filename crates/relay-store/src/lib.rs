//! Persistence collaborators for the relay.

mod memory;
mod seed;

pub use memory::{MemoryStore, DEFAULT_RETENTION};
pub use seed::SeedData;

use relay_core::error::StoreError;
use std::path::Path;

/// Build a store from an optional JSON seed file.
pub fn open_store(seed_file: Option<&Path>) -> Result<MemoryStore, StoreError> {
    match seed_file {
        Some(path) => Ok(MemoryStore::from_seed(SeedData::load(path)?)),
        None => Ok(MemoryStore::new()),
    }
}
