use crate::error::SyncError;

use super::graphql::{MemberNode, TeamNode};

/// One team as returned by a page of the teams query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    pub external_team_id: u64,
    pub name: String,
    pub slug: String,
    pub members: Vec<MemberRef>,
    /// The member connection had more nodes than the page returned.
    pub members_truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub user_id: String,
    pub login: String,
    pub email: Option<String>,
}

impl TeamRecord {
    pub fn new(external_team_id: u64, slug: &str, members: Vec<MemberRef>) -> Self {
        Self {
            external_team_id,
            name: slug.to_string(),
            slug: slug.to_string(),
            members,
            members_truncated: false,
        }
    }
}

impl MemberRef {
    pub fn new(user_id: &str, login: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            login: login.to_string(),
            email: None,
        }
    }
}

impl From<MemberNode> for MemberRef {
    fn from(node: MemberNode) -> Self {
        Self {
            user_id: node.id,
            login: node.login,
            email: node.email.filter(|e| !e.trim().is_empty()),
        }
    }
}

impl TryFrom<TeamNode> for TeamRecord {
    type Error = SyncError;

    fn try_from(node: TeamNode) -> Result<Self, Self::Error> {
        let connection = node.members.ok_or_else(|| {
            SyncError::InvariantViolation(format!("team '{}' has no member list", node.slug))
        })?;

        let returned = connection.nodes.len();
        let members_truncated = connection
            .page_info
            .map(|p| p.has_next_page)
            .unwrap_or(false)
            || connection.total_count.map(|total| total > returned).unwrap_or(false);

        Ok(Self {
            external_team_id: node.database_id,
            name: node.name,
            slug: node.slug,
            members: connection.nodes.into_iter().map(MemberRef::from).collect(),
            members_truncated,
        })
    }
}
