//! HTTP-level tests for the GitHub GraphQL client.

use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stalebot::query::{self, IssueQuery};
use stalebot::testing::{issues_response, label_response, FixedClock, IssueBuilder, MemoryReporter};
use stalebot::{BotConfig, GitHubClient, GraphQLTransport, StaleBotError, StaleIssueRun};

const TOKEN: &str = "ghp_test_token";

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(
        TOKEN,
        &format!("{}/graphql", server.uri()),
        StdDuration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_sends_query_with_variables_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(body_partial_json(json!({
            "operationName": "TrackingLabel",
            "variables": { "owner": "octo", "repo": "widgets", "label": "pending-update" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": label_response(Some(("LA_1", "pending-update"))) })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data = client(&server)
        .execute(&query::label_lookup("octo", "widgets", "pending-update"))
        .await
        .unwrap();

    assert_eq!(data["repository"]["label"]["id"], "LA_1");
}

#[tokio::test]
async fn test_http_error_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server)
        .execute(&query::close_issue("I_1"))
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn test_graphql_errors_are_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Resource not accessible by integration" }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .execute(&query::add_comment("I_1", "bye"))
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(err.to_string().contains("Resource not accessible"));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .execute(&IssueQuery::new("octo", "widgets", "pending-update").build())
        .await
        .unwrap_err();

    assert!(matches!(err, StaleBotError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_missing_data_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = client(&server)
        .execute(&query::close_issue("I_1"))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 5);
}

#[tokio::test]
async fn test_full_run_over_http() {
    let server = MockServer::start().await;
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let issue = IssueBuilder::new("I_1", 7)
        .label("pending-update")
        .comment_at(now - Duration::days(3))
        .build();

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": "TrackingLabel" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": label_response(Some(("LA_1", "pending-update")))
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": "StaleCandidates" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": issues_response(&[issue], 1, false)
        })))
        .expect(1)
        .mount(&server)
        .await;
    for operation in ["AddComment", "RemoveLabel", "CloseIssue"] {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "operationName": operation })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = BotConfig {
        owner: "octo".to_string(),
        repo: "widgets".to_string(),
        tracking_label: "pending-update".to_string(),
        ..BotConfig::default()
    };
    let client = client(&server);
    let reporter = MemoryReporter::new();

    let summary = StaleIssueRun::new(&config, &client, &FixedClock::new(now), &reporter)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.stale[0].number, 7);
}
