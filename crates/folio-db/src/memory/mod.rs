//! In-process store
//!
//! Implements every store trait over a single mutex-guarded state. Used when
//! no database is configured and by tests that need failure injection.

mod store;

pub use store::MemoryStore;
