//! Reaction and counter rows -> domain

use folio_core::{DomainError, Reaction, ReactionAggregate, ReactionType, Snowflake};
use tracing::warn;

use crate::models::{ProjectCountersModel, ReactionModel};

impl TryFrom<ReactionModel> for Reaction {
    type Error = DomainError;

    fn try_from(model: ReactionModel) -> Result<Self, Self::Error> {
        let reaction_type = model.reaction_type.parse::<ReactionType>().map_err(|_| {
            DomainError::StoreFailure(format!(
                "reaction {} has unknown type {:?}",
                model.id, model.reaction_type
            ))
        })?;

        Ok(Reaction {
            id: Snowflake::new(model.id),
            project_id: Snowflake::new(model.project_id),
            user_id: Snowflake::new(model.user_id),
            reaction_type,
            created_at: model.created_at,
        })
    }
}

/// Build an aggregate from the `reactions_count` JSON and `total_reactions`
///
/// Keys outside the known reaction set are logged and skipped.
pub fn counters_to_aggregate(model: ProjectCountersModel) -> ReactionAggregate {
    let project_id = Snowflake::new(model.id);
    let counts = model
        .reactions_count
        .0
        .into_iter()
        .filter_map(|(key, n)| match key.parse::<ReactionType>() {
            Ok(t) => Some((t, n)),
            Err(_) => {
                warn!(project_id = %project_id, key = %key, "Ignoring unknown counter key");
                None
            }
        });

    ReactionAggregate::from_counts(project_id, counts, model.total_reactions)
}
