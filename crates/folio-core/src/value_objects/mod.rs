//! Value objects - immutable types that represent domain concepts

mod capabilities;
mod snowflake;

pub use capabilities::{can_moderate, Actor, AuthContext, Capabilities, Role};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
