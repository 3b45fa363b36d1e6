//! Database models - SQLx-compatible structs for PostgreSQL tables

mod comment;
mod profile;
mod reaction;

pub use comment::CommentModel;
pub use profile::ProfileModel;
pub use reaction::{ProjectCountersModel, ReactionModel, ReactionTypeCountModel};
