//! Reference storage: rows, loaded records and the in-memory adapter.

mod memory;
mod record;

pub use memory::MemoryStore;
pub use record::{Record, Row};
