use std::time::Duration;

use serde_json::json;

use crate::error::{ErrorContext, SyncError, SyncResult};
use crate::graphql_fields::selections::teams_query;
use crate::logging::log_debug;
use crate::models::{TeamRecord, TeamsQueryData};

use super::governor::Governor;
use super::graphql::GraphQLClient;

pub struct GitHubClient {
    graphql: GraphQLClient,
    teams_query: String,
}

impl GitHubClient {
    pub fn new(
        api_url: &str,
        token: &str,
        include_email: bool,
        timeout: Duration,
        governor: Governor,
    ) -> SyncResult<Self> {
        Ok(Self {
            graphql: GraphQLClient::new(api_url, token, timeout, governor)?,
            teams_query: teams_query(include_email),
        })
    }

    /// Fetch every team of `org`, following the server cursor until the last page.
    pub async fn fetch_all_teams(&self, org: &str) -> SyncResult<Vec<TeamRecord>> {
        let mut teams = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0usize;

        loop {
            page += 1;
            let variables = json!({ "org": org, "cursor": cursor });
            let data: TeamsQueryData = self
                .graphql
                .query(&format!("teams page {}", page), &self.teams_query, variables)
                .await?;

            let organization = data
                .organization
                .with_context(|| format!("no organization found for '{}'", org))?;
            let connection = organization.teams;

            log_debug(&format!(
                "Fetched teams page {} with {} teams",
                page,
                connection.nodes.len()
            ));

            for node in connection.nodes {
                teams.push(TeamRecord::try_from(node)?);
            }

            if !connection.page_info.has_next_page {
                break;
            }

            match connection.page_info.end_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    return Err(SyncError::UpstreamDataError(format!(
                        "teams page {} reports more pages but no end cursor",
                        page
                    )))
                }
            }
        }

        Ok(teams)
    }
}
