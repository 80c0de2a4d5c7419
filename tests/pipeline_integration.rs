//! End-to-end pipeline tests against mocked GitHub and Port servers.

mod common;

use common::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use team_sync::{LimitAction, PipelineStage, SyncError};

/// Tests that every page is fetched and the cursor is passed back verbatim.
#[tokio::test]
async fn test_fetch_follows_cursor_until_last_page() {
    let server = MockServer::start().await;

    mount_teams_page(
        &server,
        None,
        teams_page(
            vec![
                team_node(1, "platform", &[("U_a", "alice"), ("U_b", "bob")]),
                team_node(2, "web", &[("U_b", "bob")]),
                team_node(3, "infra", &[("U_c", "carol")]),
            ],
            Some("Y3Vyc29yOnYyOpHOAAE="),
        ),
    )
    .await;
    mount_teams_page(
        &server,
        Some("Y3Vyc29yOnYyOpHOAAE="),
        teams_page(
            vec![
                team_node(4, "data", &[("U_d", "dave")]),
                team_node(5, "security", &[("U_a", "alice")]),
            ],
            None,
        ),
    )
    .await;

    let teams = github_client(&server, fast_policy())
        .fetch_all_teams("acme")
        .await
        .unwrap();

    let ids: Vec<u64> = teams.iter().map(|t| t.external_team_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

/// Tests the full fetch, aggregate, authenticate and upsert flow.
#[tokio::test]
async fn test_full_sync_upserts_one_entity_per_user() {
    let server = MockServer::start().await;

    mount_teams_page(
        &server,
        None,
        teams_page(
            vec![
                team_node(1, "platform", &[("U_a", "alice"), ("U_b", "bob")]),
                team_node(2, "web", &[("U_b", "bob"), ("U_c", "carol")]),
            ],
            None,
        ),
    )
    .await;
    mount_access_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/blueprints/githubUser/entities"))
        .and(query_param("upsert", "true"))
        .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
        .and(body_json(json!({
            "entities": [
                { "identifier": "U_a", "title": "alice", "blueprint": "githubUser",
                  "relations": { "githubTeams": ["1"] } },
                { "identifier": "U_b", "title": "bob", "blueprint": "githubUser",
                  "relations": { "githubTeams": ["1", "2"] } },
                { "identifier": "U_c", "title": "carol", "blueprint": "githubUser",
                  "relations": { "githubTeams": ["2"] } }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut pipeline = pipeline(&server, fast_policy());
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.teams, 2);
    assert_eq!(report.entities, 3);
    assert!(!report.dry_run);
    assert_eq!(
        pipeline.stages(),
        &[
            PipelineStage::Start,
            PipelineStage::Fetching,
            PipelineStage::Aggregating,
            PipelineStage::Authenticating,
            PipelineStage::Upserting,
            PipelineStage::Done,
        ]
    );
}

/// Tests that an organization without teams fails before authentication.
#[tokio::test]
async fn test_empty_org_fails_without_authenticating() {
    let server = MockServer::start().await;

    mount_teams_page(&server, None, teams_page(vec![], None)).await;
    mount_access_token(&server, 0).await;

    let mut pipeline = pipeline(&server, fast_policy());
    let err = pipeline.run().await.unwrap_err();

    assert!(err.to_string().contains("No GitHub teams found"));
    assert!(matches!(pipeline.stage(), PipelineStage::Failed(_)));
    assert!(!pipeline.stages().contains(&PipelineStage::Authenticating));
}

/// Tests that a response without an organization is reported as bad upstream data.
#[tokio::test]
async fn test_missing_organization_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "organization": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = github_client(&server, fast_policy())
        .fetch_all_teams("acme")
        .await
        .unwrap_err();

    match err {
        SyncError::UpstreamDataError(msg) => assert!(msg.contains("no organization found")),
        other => panic!("Expected UpstreamDataError, got {:?}", other),
    }
}

/// Tests that a page with the wrong shape is reported as bad upstream data.
#[tokio::test]
async fn test_page_without_page_info_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "organization": { "teams": { "nodes": [] } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = github_client(&server, fast_policy())
        .fetch_all_teams("acme")
        .await
        .unwrap_err();

    match err {
        SyncError::UpstreamDataError(msg) => assert!(msg.contains("pageInfo")),
        other => panic!("Expected UpstreamDataError, got {:?}", other),
    }
}

/// Tests that a team without a numeric id fails the run as bad upstream data.
#[tokio::test]
async fn test_team_with_null_database_id_is_upstream_error() {
    let server = MockServer::start().await;

    let mut node = team_node(1, "platform", &[("U_a", "alice")]);
    node["databaseId"] = json!(null);
    mount_teams_page(&server, None, teams_page(vec![node], None)).await;
    mount_access_token(&server, 0).await;

    let mut pipeline = pipeline(&server, fast_policy());
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, SyncError::UpstreamDataError(_)));
    assert!(matches!(pipeline.stage(), PipelineStage::Failed(_)));
}

/// Tests that a primary rate limit is retried once and the fetch still completes.
#[tokio::test]
async fn test_primary_rate_limit_is_retried_transparently() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "0")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_teams_page(
        &server,
        None,
        teams_page(vec![team_node(1, "platform", &[("U_a", "alice")])], None),
    )
    .await;

    let teams = github_client(&server, fast_policy())
        .fetch_all_teams("acme")
        .await
        .unwrap();

    assert_eq!(teams.len(), 1);
}

/// Tests that a secondary rate limit aborts under the default policy.
#[tokio::test]
async fn test_secondary_rate_limit_aborts_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("retry-after", "0")
                .set_body_json(json!({
                    "message": "You have exceeded a secondary rate limit. Please wait a few minutes before you try again."
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = github_client(&server, fast_policy())
        .fetch_all_teams("acme")
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::TransportError(_)));
}

/// Tests that a secondary rate limit is retried once when configured to.
#[tokio::test]
async fn test_secondary_rate_limit_retry_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("retry-after", "0")
                .set_body_json(json!({ "message": "secondary rate limit" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let policy = fast_policy().with_secondary_limit(LimitAction::RetryOnce);
    let err = github_client(&server, policy)
        .fetch_all_teams("acme")
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::TransportError(_)));
}

/// Tests that persistent server errors exhaust the retry budget.
#[tokio::test]
async fn test_transient_errors_exhaust_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = github_client(&server, fast_policy().with_max_retries(2))
        .fetch_all_teams("acme")
        .await
        .unwrap_err();

    match err {
        SyncError::TransportError(msg) => {
            assert!(msg.contains("teams page 1"));
            assert!(msg.contains("gave up after 2 retries"));
        }
        other => panic!("Expected TransportError, got {:?}", other),
    }
}

/// Tests that rejected credentials stop the run before any upsert.
#[tokio::test]
async fn test_auth_failure_skips_upsert() {
    let server = MockServer::start().await;

    mount_teams_page(
        &server,
        None,
        teams_page(vec![team_node(1, "platform", &[("U_a", "alice")])], None),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/access_token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "ok": false, "message": "invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/blueprints/githubUser/entities"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut pipeline = pipeline(&server, fast_policy());
    let err = pipeline.run().await.unwrap_err();

    match &err {
        SyncError::AuthError(msg) => {
            assert!(msg.contains("401"));
            assert!(!msg.contains(CLIENT_SECRET));
            assert!(!msg.contains(CLIENT_ID));
        }
        other => panic!("Expected AuthError, got {:?}", other),
    }
    assert!(!pipeline.stages().contains(&PipelineStage::Upserting));
}

/// Tests that a rejected write carries the catalog's error payload.
#[tokio::test]
async fn test_upsert_rejection_surfaces_payload() {
    let server = MockServer::start().await;

    mount_teams_page(
        &server,
        None,
        teams_page(vec![team_node(1, "platform", &[("U_a", "alice")])], None),
    )
    .await;
    mount_access_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/blueprints/githubUser/entities"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "ok": false,
            "error": "not_found",
            "message": "Related entity with identifier \"1\" was not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut pipeline = pipeline(&server, fast_policy());
    let err = pipeline.run().await.unwrap_err();

    match err {
        SyncError::CatalogWriteError { status, body } => {
            assert_eq!(status, 422);
            assert!(body.contains("not_found"));
        }
        other => panic!("Expected CatalogWriteError, got {:?}", other),
    }
    match pipeline.stage() {
        PipelineStage::Failed(reason) => assert!(reason.contains("422")),
        other => panic!("Expected Failed stage, got {:?}", other),
    }
}

/// Tests that a dry run aggregates without contacting Port.
#[tokio::test]
async fn test_dry_run_skips_catalog() {
    let server = MockServer::start().await;

    mount_teams_page(
        &server,
        None,
        teams_page(
            vec![
                team_node(1, "platform", &[("U_a", "alice"), ("U_b", "bob")]),
                team_node(2, "web", &[("U_b", "bob")]),
            ],
            None,
        ),
    )
    .await;
    mount_access_token(&server, 0).await;

    let mut pipeline = pipeline(&server, fast_policy()).with_dry_run(true);
    let report = pipeline.run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.entities, 2);
    let payload = report.payload.expect("payload");
    assert_eq!(payload.entities[1].relations["githubTeams"], vec!["1", "2"]);
    assert_eq!(pipeline.stage(), &PipelineStage::Done);
}

/// Tests that identical source data yields identical batches and repeated upserts.
#[tokio::test]
async fn test_repeated_runs_send_identical_batches() {
    let server = MockServer::start().await;

    let page = teams_page(
        vec![
            team_node(7, "platform", &[("U_a", "alice"), ("U_b", "bob")]),
            team_node(3, "web", &[("U_b", "bob"), ("U_c", "carol")]),
        ],
        None,
    );
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page))
        .expect(2)
        .mount(&server)
        .await;
    mount_access_token(&server, 2).await;

    let expected = json!({
        "entities": [
            { "identifier": "U_a", "title": "alice", "blueprint": "githubUser",
              "relations": { "githubTeams": ["7"] } },
            { "identifier": "U_b", "title": "bob", "blueprint": "githubUser",
              "relations": { "githubTeams": ["3", "7"] } },
            { "identifier": "U_c", "title": "carol", "blueprint": "githubUser",
              "relations": { "githubTeams": ["3"] } }
        ]
    });
    Mock::given(method("POST"))
        .and(path("/v1/blueprints/githubUser/entities"))
        .and(body_json(expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(2)
        .mount(&server)
        .await;

    let first = pipeline(&server, fast_policy()).run().await.unwrap();
    let second = pipeline(&server, fast_policy()).run().await.unwrap();

    assert_eq!(first.payload, second.payload);
    assert_eq!(first.entities, second.entities);
}

/// Tests that a plain-text success body from the catalog still completes the run.
#[tokio::test]
async fn test_upsert_with_plain_text_success_body_completes() {
    let server = MockServer::start().await;

    mount_teams_page(
        &server,
        None,
        teams_page(vec![team_node(1, "platform", &[("U_a", "alice")])], None),
    )
    .await;
    mount_access_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/blueprints/githubUser/entities"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let mut pipeline = pipeline(&server, fast_policy());
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.entities, 1);
    assert_eq!(pipeline.stage(), &PipelineStage::Done);
}
