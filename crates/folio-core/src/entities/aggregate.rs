//! Denormalized per-project reaction counters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::reaction::{Reaction, ReactionTransition, ReactionType};
use crate::value_objects::Snowflake;

/// Reaction counters owned by a project
///
/// `counts` always carries all eight reaction types so clients can render
/// zeros without special-casing missing keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionAggregate {
    pub project_id: Snowflake,
    pub counts: BTreeMap<ReactionType, i64>,
    pub total: i64,
}

impl ReactionAggregate {
    pub fn empty(project_id: Snowflake) -> Self {
        Self {
            project_id,
            counts: ReactionType::ALL.into_iter().map(|t| (t, 0)).collect(),
            total: 0,
        }
    }

    /// Builds counters from stored values, filling absent types with zero
    pub fn from_counts<I>(project_id: Snowflake, counts: I, total: i64) -> Self
    where
        I: IntoIterator<Item = (ReactionType, i64)>,
    {
        let mut aggregate = Self::empty(project_id);
        for (t, n) in counts {
            aggregate.counts.insert(t, n);
        }
        aggregate.total = total;
        aggregate
    }

    /// Recount from ledger rows
    pub fn from_reactions<'a, I>(project_id: Snowflake, reactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Reaction>,
    {
        let mut aggregate = Self::empty(project_id);
        for reaction in reactions {
            *aggregate.counts.entry(reaction.reaction_type).or_insert(0) += 1;
            aggregate.total += 1;
        }
        aggregate
    }

    pub fn apply(&mut self, transition: &ReactionTransition) {
        for (t, delta) in transition.counter_deltas() {
            *self.counts.entry(t).or_insert(0) += delta;
        }
        self.total += transition.total_delta();
    }

    pub fn count(&self, reaction_type: ReactionType) -> i64 {
        self.counts.get(&reaction_type).copied().unwrap_or(0)
    }

    /// `sum(counts) == total` and no counter is negative
    pub fn is_consistent(&self) -> bool {
        self.counts.values().all(|n| *n >= 0) && self.counts.values().sum::<i64>() == self.total
    }
}
