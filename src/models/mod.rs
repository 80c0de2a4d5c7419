pub mod entity;
pub mod graphql;
pub mod port;
pub mod team;

// Re-export commonly used types
pub use entity::{EntityBatch, NormalizedUserEntity, PortEntity, UpsertPayload};
pub use graphql::{GraphQLError, GraphQLRequest, GraphQLResponse, TeamNode, TeamsQueryData};
pub use port::{BearerToken, PortCredentials, UpsertResult};
pub use team::{MemberRef, TeamRecord};

use serde::Deserialize;

// Connection type used by GraphQL pagination
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub page_info: PageInfo,
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}
