//! Insight endpoints fall back to templated text when the provider fails.
//!
//! Run with: `cargo test -p taskhive-api --test insights_test`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use helpers::api_path;
use helpers::auth::{register_individual, register_manager, register_member, register_team_lead};
use helpers::doubles::FailingProvider;
use helpers::TestOptions;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use taskhive_services::InsightSummarizer;

#[tokio::test]
async fn test_dashboard_insights_fall_back_when_provider_fails() {
    let app = helpers::setup_test_app_with(TestOptions {
        summarizer: InsightSummarizer::new(
            Some(Arc::new(FailingProvider)),
            Duration::from_secs(1),
        ),
        ..TestOptions::default()
    })
    .await;
    let client = app.client();
    let dana = register_individual(client, "dana@example.test").await;

    for title in ["Plan trip", "Book hotel"] {
        let res = client
            .post(&api_path("/tasks"))
            .add_header("Authorization", dana.bearer())
            .json(&json!({ "title": title, "isPersonal": true }))
            .await;
        assert_eq!(res.status_code(), 201, "{}", res.text());
    }

    let res = client
        .get(&api_path("/dashboard-insights"))
        .add_header("Authorization", dana.bearer())
        .await;
    assert_eq!(res.status_code(), 200, "{}", res.text());
    let body: Value = res.json();
    assert_eq!(body["stats"]["totalTasks"], 2);
    assert_eq!(body["stats"]["todo"], 2);
    assert!(!body["insights"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_project_insights_are_scoped_and_stored() {
    let app = helpers::setup_test_app().await;
    let client = app.client();
    let alice = register_manager(client, "alice@acme.test", "Acme").await;
    let bob = register_team_lead(client, "bob@acme.test", "Acme").await;
    let carol = register_member(client, "carol@acme.test", "Acme", 1).await;
    register_manager(client, "erin@globex.test", "Globex").await;
    let dave = register_team_lead(client, "dave@globex.test", "Globex").await;

    let project: Value = client
        .post(&api_path("/projects"))
        .add_header("Authorization", alice.bearer())
        .json(&json!({ "title": "Launch", "assignedToId": bob.user_id }))
        .await
        .json();
    let project_id = project["id"].as_str().expect("project id").to_string();

    let res = client
        .post(&api_path("/tasks"))
        .add_header("Authorization", bob.bearer())
        .json(&json!({ "title": "Draft", "projectId": project_id, "assigneeId": carol.user_id }))
        .await;
    assert_eq!(res.status_code(), 201, "{}", res.text());

    let res = client
        .post(&api_path("/project-insights"))
        .add_header("Authorization", alice.bearer())
        .json(&json!({ "projectId": project_id }))
        .await;
    assert_eq!(res.status_code(), 200, "{}", res.text());
    let body: Value = res.json();
    assert_eq!(body["project"]["title"], "Launch");
    assert_eq!(body["stats"]["totalTasks"], 1);

    let res = client
        .get(&api_path("/project-insights"))
        .add_query_param("projectId", &project_id)
        .add_header("Authorization", dave.bearer())
        .await;
    assert_eq!(res.status_code(), 404);

    let res = client
        .post(&api_path("/insights"))
        .add_header("Authorization", alice.bearer())
        .json(&json!({ "projectId": project_id }))
        .await;
    assert_eq!(res.status_code(), 201, "{}", res.text());

    let stored: Value = client
        .get(&api_path("/insights"))
        .add_query_param("projectId", &project_id)
        .add_header("Authorization", alice.bearer())
        .await
        .json();
    assert_eq!(stored["insights"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_member_summaries_only_cover_their_own_tasks() {
    let app = helpers::setup_test_app().await;
    let client = app.client();
    let alice = register_manager(client, "alice@acme.test", "Acme").await;
    let bob = register_team_lead(client, "bob@acme.test", "Acme").await;
    let carol = register_member(client, "carol@acme.test", "Acme", 1).await;
    let eve = register_member(client, "eve@acme.test", "Acme", 1).await;

    let project: Value = client
        .post(&api_path("/projects"))
        .add_header("Authorization", alice.bearer())
        .json(&json!({ "title": "Launch", "assignedToId": bob.user_id }))
        .await
        .json();
    let project_id = project["id"].as_str().expect("project id").to_string();

    for (title, assignee, status) in [
        ("Draft copy", carol.user_id, "TODO"),
        ("Confidential vendor dispute", eve.user_id, "BLOCKED"),
    ] {
        let res = client
            .post(&api_path("/tasks"))
            .add_header("Authorization", bob.bearer())
            .json(&json!({
                "title": title,
                "projectId": project_id,
                "assigneeId": assignee,
                "status": status,
            }))
            .await;
        assert_eq!(res.status_code(), 201, "{}", res.text());
    }

    let res = client
        .post(&api_path("/insights"))
        .add_header("Authorization", carol.bearer())
        .json(&json!({ "projectId": project_id }))
        .await;
    assert_eq!(res.status_code(), 201, "{}", res.text());
    let carol_summary: Value = res.json();
    let text = carol_summary["summary"].as_str().unwrap_or_default();
    assert!(text.contains("(0/1 tasks done)"), "{}", text);
    assert!(!text.contains("Confidential vendor dispute"), "{}", text);

    let res = client
        .post(&api_path("/insights"))
        .add_header("Authorization", alice.bearer())
        .json(&json!({ "projectId": project_id }))
        .await;
    assert_eq!(res.status_code(), 201, "{}", res.text());
    let alice_summary: Value = res.json();
    let text = alice_summary["summary"].as_str().unwrap_or_default();
    assert!(text.contains("Confidential vendor dispute"), "{}", text);

    // Stored summaries written by the manager stay out of the member's list
    let as_member: Value = client
        .get(&api_path("/insights"))
        .add_query_param("projectId", &project_id)
        .add_header("Authorization", carol.bearer())
        .await
        .json();
    let ids: Vec<&str> = as_member["insights"]
        .as_array()
        .map(|list| list.iter().filter_map(|i| i["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![carol_summary["id"].as_str().expect("insight id")]);

    let as_manager: Value = client
        .get(&api_path("/insights"))
        .add_query_param("projectId", &project_id)
        .add_header("Authorization", alice.bearer())
        .await
        .json();
    assert_eq!(as_manager["insights"].as_array().map(Vec::len), Some(2));
}
