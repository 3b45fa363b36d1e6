//! Reaction entity and the per-user toggle state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// The closed set of reactions a project accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Love,
    Fire,
    Wow,
    Laugh,
    Idea,
    Rocket,
    Clap,
}

impl ReactionType {
    pub const ALL: [ReactionType; 8] = [
        ReactionType::Like,
        ReactionType::Love,
        ReactionType::Fire,
        ReactionType::Wow,
        ReactionType::Laugh,
        ReactionType::Idea,
        ReactionType::Rocket,
        ReactionType::Clap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Love => "love",
            ReactionType::Fire => "fire",
            ReactionType::Wow => "wow",
            ReactionType::Laugh => "laugh",
            ReactionType::Idea => "idea",
            ReactionType::Rocket => "rocket",
            ReactionType::Clap => "clap",
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        if needle.is_empty() {
            return Err(DomainError::InvalidArgument(
                "reaction type is required".to_string(),
            ));
        }
        ReactionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DomainError::InvalidArgument(format!("unknown reaction type: {needle}")))
    }
}

/// A live ledger row: `user_id` currently reacts to `project_id` with `reaction_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Snowflake,
    pub project_id: Snowflake,
    pub user_id: Snowflake,
    pub reaction_type: ReactionType,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub fn new(
        id: Snowflake,
        project_id: Snowflake,
        user_id: Snowflake,
        reaction_type: ReactionType,
    ) -> Self {
        Self {
            id,
            project_id,
            user_id,
            reaction_type,
            created_at: Utc::now(),
        }
    }
}

/// Per `(project, user)` state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "type", rename_all = "lowercase")]
pub enum ReactionState {
    #[default]
    None,
    Reacted(ReactionType),
}

impl ReactionState {
    pub fn from_reaction(reaction: Option<&Reaction>) -> Self {
        reaction.map_or(ReactionState::None, |r| ReactionState::Reacted(r.reaction_type))
    }

    /// Where a toggle request for `requested` leads from this state
    pub fn toggle(self, requested: ReactionType) -> ReactionTransition {
        let to = match self {
            ReactionState::Reacted(current) if current == requested => ReactionState::None,
            _ => ReactionState::Reacted(requested),
        };
        ReactionTransition { from: self, to }
    }

    pub fn reaction_type(self) -> Option<ReactionType> {
        match self {
            ReactionState::None => None,
            ReactionState::Reacted(t) => Some(t),
        }
    }
}

/// What a toggle does to the ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// `None -> Reacted(t)`: insert
    Added,
    /// `Reacted(t1) -> Reacted(t2)`: replace
    Replaced,
    /// `Reacted(t) -> None`: delete
    Removed,
}

/// A single step of the toggle state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionTransition {
    pub from: ReactionState,
    pub to: ReactionState,
}

impl ReactionTransition {
    pub fn kind(&self) -> TransitionKind {
        match (self.from, self.to) {
            (ReactionState::None, _) => TransitionKind::Added,
            (_, ReactionState::None) => TransitionKind::Removed,
            _ => TransitionKind::Replaced,
        }
    }

    /// Per-type counter deltas; at most one decrement and one increment.
    pub fn counter_deltas(&self) -> Vec<(ReactionType, i64)> {
        let mut deltas = Vec::with_capacity(2);
        if let Some(old) = self.from.reaction_type() {
            deltas.push((old, -1));
        }
        if let Some(new) = self.to.reaction_type() {
            deltas.push((new, 1));
        }
        deltas
    }

    pub fn total_delta(&self) -> i64 {
        match self.kind() {
            TransitionKind::Added => 1,
            TransitionKind::Removed => -1,
            TransitionKind::Replaced => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_type_parse() {
        assert_eq!("like".parse::<ReactionType>().unwrap(), ReactionType::Like);
        assert_eq!(" Rocket ".parse::<ReactionType>().unwrap(), ReactionType::Rocket);
        assert!(matches!(
            "thumbs".parse::<ReactionType>(),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(matches!(
            "".parse::<ReactionType>(),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_reaction_type_serde_lowercase() {
        let json = serde_json::to_string(&ReactionType::Clap).unwrap();
        assert_eq!(json, "\"clap\"");
    }

    #[test]
    fn test_toggle_from_none_adds() {
        let t = ReactionState::None.toggle(ReactionType::Like);
        assert_eq!(t.to, ReactionState::Reacted(ReactionType::Like));
        assert_eq!(t.kind(), TransitionKind::Added);
        assert_eq!(t.counter_deltas(), vec![(ReactionType::Like, 1)]);
        assert_eq!(t.total_delta(), 1);
    }

    #[test]
    fn test_toggle_same_type_removes() {
        let t = ReactionState::Reacted(ReactionType::Love).toggle(ReactionType::Love);
        assert_eq!(t.to, ReactionState::None);
        assert_eq!(t.kind(), TransitionKind::Removed);
        assert_eq!(t.counter_deltas(), vec![(ReactionType::Love, -1)]);
        assert_eq!(t.total_delta(), -1);
    }

    #[test]
    fn test_toggle_other_type_replaces() {
        let t = ReactionState::Reacted(ReactionType::Like).toggle(ReactionType::Love);
        assert_eq!(t.to, ReactionState::Reacted(ReactionType::Love));
        assert_eq!(t.kind(), TransitionKind::Replaced);
        assert_eq!(
            t.counter_deltas(),
            vec![(ReactionType::Like, -1), (ReactionType::Love, 1)]
        );
        assert_eq!(t.total_delta(), 0);
    }

    #[test]
    fn test_reaction_state_json_shape() {
        let json = serde_json::to_value(ReactionState::Reacted(ReactionType::Fire)).unwrap();
        assert_eq!(json, serde_json::json!({"state": "reacted", "type": "fire"}));

        let json = serde_json::to_value(ReactionState::None).unwrap();
        assert_eq!(json, serde_json::json!({"state": "none"}));
    }
}
