use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct GraphQLRequest<'a> {
    pub query: &'a str,
    pub variables: Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

// Teams query data structures
#[derive(Debug, Deserialize)]
pub struct TeamsQueryData {
    pub organization: Option<OrganizationData>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationData {
    pub teams: super::Connection<TeamNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNode {
    pub name: String,
    pub database_id: u64,
    pub slug: String,
    pub members: Option<MemberConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberConnection {
    #[serde(default)]
    pub total_count: Option<usize>,
    #[serde(default)]
    pub page_info: Option<MemberPageInfo>,
    pub nodes: Vec<MemberNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPageInfo {
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct MemberNode {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
}
