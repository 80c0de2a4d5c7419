use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::constants::TEAMS_RELATION;

/// One catalog record per distinct GitHub user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUserEntity {
    pub identifier: String,
    pub title: String,
    pub email: Option<String>,
    pub teams: BTreeSet<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityBatch {
    pub entities: Vec<NormalizedUserEntity>,
    /// Slugs of teams whose member list was cut at the page size.
    pub truncated_teams: Vec<String>,
}

/// Entity as the catalog expects it on the wire.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PortEntity {
    pub identifier: String,
    pub title: String,
    pub blueprint: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    pub relations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpsertPayload {
    pub entities: Vec<PortEntity>,
}

impl NormalizedUserEntity {
    pub fn new(identifier: &str, title: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            title: title.to_string(),
            email: None,
            teams: BTreeSet::new(),
        }
    }

    pub fn to_wire(&self, blueprint: &str) -> PortEntity {
        let mut properties = BTreeMap::new();
        if let Some(email) = &self.email {
            properties.insert("email".to_string(), email.clone());
        }

        let mut relations = BTreeMap::new();
        relations.insert(
            TEAMS_RELATION.to_string(),
            self.teams.iter().map(|id| id.to_string()).collect(),
        );

        PortEntity {
            identifier: self.identifier.clone(),
            title: self.title.clone(),
            blueprint: blueprint.to_string(),
            properties,
            relations,
        }
    }
}

impl EntityBatch {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn to_payload(&self, blueprint: &str) -> UpsertPayload {
        UpsertPayload {
            entities: self.entities.iter().map(|e| e.to_wire(blueprint)).collect(),
        }
    }
}
