//! Model to entity mappers
//!
//! Conversions from database rows into `folio-core` entities. Reaction rows
//! carry the type as text, so that conversion is fallible.

mod comment;
mod profile;
mod reaction;

pub use reaction::counters_to_aggregate;
