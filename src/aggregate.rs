use std::collections::HashMap;

use crate::error::{SyncError, SyncResult};
use crate::logging::log_warn;
use crate::models::{EntityBatch, NormalizedUserEntity, TeamRecord};

/// Folds team records into one entity per distinct user.
///
/// Entities keep the order in which their user was first seen.
#[derive(Debug, Default, Clone)]
pub struct MembershipAggregator {
    index: HashMap<String, usize>,
    entities: Vec<NormalizedUserEntity>,
    truncated_teams: Vec<String>,
}

impl MembershipAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one team's members to the accumulated state.
    pub fn fold(mut self, team: &TeamRecord) -> SyncResult<Self> {
        if team.members_truncated && !self.truncated_teams.contains(&team.slug) {
            self.truncated_teams.push(team.slug.clone());
        }

        for member in &team.members {
            if member.user_id.is_empty() {
                return Err(SyncError::InvariantViolation(format!(
                    "member '{}' of team '{}' has no user id",
                    member.login, team.slug
                )));
            }

            let position = match self.index.get(&member.user_id) {
                Some(&position) => position,
                None => {
                    self.entities
                        .push(NormalizedUserEntity::new(&member.user_id, &member.login));
                    let position = self.entities.len() - 1;
                    self.index.insert(member.user_id.clone(), position);
                    position
                }
            };

            let entity = &mut self.entities[position];
            if entity.email.is_none() {
                entity.email = member.email.clone();
            }
            entity.teams.insert(team.external_team_id);
        }

        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn finish(self) -> EntityBatch {
        EntityBatch {
            entities: self.entities,
            truncated_teams: self.truncated_teams,
        }
    }
}

/// Aggregate all fetched teams into an entity batch.
pub fn aggregate(teams: &[TeamRecord]) -> SyncResult<EntityBatch> {
    let batch = teams
        .iter()
        .try_fold(MembershipAggregator::new(), |state, team| state.fold(team))?
        .finish();

    for slug in &batch.truncated_teams {
        log_warn(&format!(
            "Team '{}' has more members than one page returns; extra members were not synced",
            slug
        ));
    }

    Ok(batch)
}
