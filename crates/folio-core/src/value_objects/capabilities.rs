//! Actor roles and the capability set each role grants
//!
//! Permission checks go through [`Capabilities`] (and [`can_moderate`]) instead
//! of comparing role names, so adding a role only means mapping it to flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::Snowflake;

bitflags! {
    /// What an authenticated actor may do
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Toggle reactions on projects
        const REACT              = 1 << 0;
        /// Post comments and replies
        const COMMENT            = 1 << 1;
        /// Edit comments written by someone else
        const EDIT_ANY_COMMENT   = 1 << 2;
        /// Delete comments written by someone else
        const DELETE_ANY_COMMENT = 1 << 3;
        /// Rebuild a project's reaction counters from the ledger
        const RECONCILE_COUNTERS = 1 << 4;

        const MEMBER = Self::REACT.bits() | Self::COMMENT.bits();

        const MODERATOR = Self::MEMBER.bits()
            | Self::EDIT_ANY_COMMENT.bits()
            | Self::DELETE_ANY_COMMENT.bits();

        const ADMIN = Self::MODERATOR.bits() | Self::RECONCILE_COUNTERS.bits();
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::MEMBER
    }
}

/// Role as supplied by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

impl Role {
    pub fn capabilities(self) -> Capabilities {
        match self {
            Role::Member => Capabilities::MEMBER,
            Role::Moderator => Capabilities::MODERATOR,
            Role::Admin => Capabilities::ADMIN,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Unknown role names fall back to `Member`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "moderator" | "mod" => Role::Moderator,
            "admin" => Role::Admin,
            _ => Role::Member,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated user performing an engagement action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Snowflake,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Snowflake, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn member(user_id: Snowflake) -> Self {
        Self::new(user_id, Role::Member)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.role.capabilities()
    }

    #[inline]
    pub fn can(&self, capability: Capabilities) -> bool {
        self.capabilities().contains(capability)
    }

    /// Author or moderator
    pub fn can_edit_comment_of(&self, author_id: Snowflake) -> bool {
        self.user_id == author_id || self.can(Capabilities::EDIT_ANY_COMMENT)
    }

    /// Author or moderator
    pub fn can_delete_comment_of(&self, author_id: Snowflake) -> bool {
        self.user_id == author_id || self.can(Capabilities::DELETE_ANY_COMMENT)
    }
}

/// True when the actor may edit and delete other users' comments.
pub fn can_moderate(actor: &Actor) -> bool {
    actor.can(Capabilities::EDIT_ANY_COMMENT | Capabilities::DELETE_ANY_COMMENT)
}

/// Caller identity for a single engine call
///
/// Anonymous callers may read; every mutation requires [`AuthContext::actor`]
/// to succeed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Authenticated(Actor),
}

impl AuthContext {
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            AuthContext::Anonymous => None,
            AuthContext::Authenticated(actor) => Some(actor),
        }
    }

    pub fn user_id(&self) -> Option<Snowflake> {
        self.actor().map(|a| a.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.actor().is_some()
    }
}

impl From<Actor> for AuthContext {
    fn from(actor: Actor) -> Self {
        AuthContext::Authenticated(actor)
    }
}

impl From<Option<Actor>> for AuthContext {
    fn from(actor: Option<Actor>) -> Self {
        actor.map_or(AuthContext::Anonymous, AuthContext::Authenticated)
    }
}
