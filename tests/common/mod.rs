//! Shared fixtures for the pipeline integration tests.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use team_sync::{GitHubClient, Governor, Pipeline, PortClient, PortCredentials, RateLimitPolicy};

pub const CLIENT_ID: &str = "port-client-id";
pub const CLIENT_SECRET: &str = "port-client-secret";
pub const ACCESS_TOKEN: &str = "port-access-token";

/// Policy with zero backoff so retries do not slow the tests down.
pub fn fast_policy() -> RateLimitPolicy {
    RateLimitPolicy::default()
        .with_transient_backoff(Duration::ZERO)
        .with_fallback_wait(Duration::ZERO)
}

pub fn github_client(server: &MockServer, policy: RateLimitPolicy) -> GitHubClient {
    GitHubClient::new(
        &format!("{}/graphql", server.uri()),
        "ghp_test_token",
        false,
        Duration::from_secs(5),
        Governor::new(policy),
    )
    .expect("github client")
}

pub fn port_client(server: &MockServer, policy: RateLimitPolicy) -> PortClient {
    PortClient::new(
        &format!("{}/v1", server.uri()),
        "githubUser",
        Duration::from_secs(5),
        Governor::new(policy),
    )
    .expect("port client")
}

pub fn pipeline(server: &MockServer, policy: RateLimitPolicy) -> Pipeline {
    Pipeline::new(
        github_client(server, policy.clone()),
        port_client(server, policy),
        "acme",
        PortCredentials::new(CLIENT_ID, CLIENT_SECRET),
    )
}

/// Test data factory for a GitHub team node; members are `(id, login)` pairs.
pub fn team_node(database_id: u64, slug: &str, members: &[(&str, &str)]) -> Value {
    let nodes: Vec<Value> = members
        .iter()
        .map(|(id, login)| json!({ "id": id, "login": login }))
        .collect();

    json!({
        "name": slug,
        "databaseId": database_id,
        "slug": slug,
        "members": {
            "totalCount": nodes.len(),
            "pageInfo": { "hasNextPage": false },
            "nodes": nodes
        }
    })
}

/// Wraps team nodes in a teams query response page.
pub fn teams_page(nodes: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "data": {
            "organization": {
                "teams": {
                    "pageInfo": {
                        "hasNextPage": next_cursor.is_some(),
                        "endCursor": next_cursor
                    },
                    "nodes": nodes
                }
            }
        }
    })
}

/// Mount a teams page answering requests sent with `cursor`.
pub async fn mount_teams_page(server: &MockServer, cursor: Option<&str>, page: Value) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({ "variables": { "org": "acme", "cursor": cursor } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(page))
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_access_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/access_token"))
        .and(body_partial_json(json!({ "clientId": CLIENT_ID, "clientSecret": CLIENT_SECRET })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "accessToken": ACCESS_TOKEN })),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}
