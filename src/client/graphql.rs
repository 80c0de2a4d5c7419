use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::constants::USER_AGENT;
use crate::error::{SyncError, SyncResult};
use crate::models::{GraphQLRequest, GraphQLResponse};

use super::governor::Governor;

/// GraphQL transport for the GitHub API, with every request governed.
pub struct GraphQLClient {
    client: Client,
    api_url: String,
    token: String,
    governor: Governor,
}

impl GraphQLClient {
    pub fn new(
        api_url: &str,
        token: &str,
        timeout: Duration,
        governor: Governor,
    ) -> SyncResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            token: token.to_string(),
            governor,
        })
    }

    /// Execute a GraphQL query with variables
    pub async fn query<T>(&self, label: &str, query: &str, variables: Value) -> SyncResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request_body = GraphQLRequest { query, variables };

        let reply = self
            .governor
            .send(label, || {
                self.client
                    .post(&self.api_url)
                    .header("Authorization", format!("bearer {}", self.token))
                    .json(&request_body)
                    .send()
            })
            .await?;

        if !reply.is_success() {
            return Err(SyncError::UpstreamDataError(format!(
                "API request failed with status {}: {}",
                reply.status,
                reply.body.trim()
            )));
        }

        let response: GraphQLResponse<T> = serde_json::from_str(&reply.body)
            .map_err(|e| SyncError::UpstreamDataError(format!("malformed response: {}", e)))?;
        Self::extract_data(response)
    }

    /// Extract data from GraphQL response, handling errors
    fn extract_data<T>(response: GraphQLResponse<T>) -> SyncResult<T> {
        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            let error_messages = errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(SyncError::UpstreamDataError(format!("GraphQL errors: {}", error_messages)));
        }

        response
            .data
            .ok_or_else(|| SyncError::UpstreamDataError("No data in response".to_string()))
    }
}
