//! Registration, login and password reset.
//!
//! Run with: `cargo test -p taskhive-api --test auth_test`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use helpers::api_path;
use helpers::auth::{
    login, register_individual, register_manager, register_team_lead, TEST_PASSWORD,
};
use serde_json::{json, Value};

#[tokio::test]
async fn test_login_sets_session_cookie_and_rejects_bad_password() {
    let app = helpers::setup_test_app().await;
    let client = app.client();
    register_manager(client, "alice@acme.test", "Acme").await;

    let res = client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": "ALICE@acme.test", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(res.status_code(), 200);
    let cookie = res
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("session cookie");
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    let body: Value = res.json();
    assert_eq!(body["role"], "MANAGER");

    let res = client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": "alice@acme.test", "password": "wrong-pass" }))
        .await;
    assert_eq!(res.status_code(), 401);
    let wrong_password: Value = res.json();

    let res = client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": "nobody@acme.test", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(res.status_code(), 401);
    let unknown_email: Value = res.json();
    // Same answer either way
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(unknown_email["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_unknown_organization() {
    let app = helpers::setup_test_app().await;
    let client = app.client();
    register_manager(client, "alice@acme.test", "Acme").await;

    let res = client
        .post(&api_path("/auth/register"))
        .json(&json!({
            "email": "alice@acme.test",
            "password": TEST_PASSWORD,
            "role": "INDIVIDUAL",
        }))
        .await;
    assert_eq!(res.status_code(), 409);

    let res = client
        .post(&api_path("/auth/register"))
        .json(&json!({
            "email": "other@acme.test",
            "password": TEST_PASSWORD,
            "role": "MANAGER",
            "organizationName": "Acme",
        }))
        .await;
    assert_eq!(res.status_code(), 409, "organization names are unique");

    let res = client
        .post(&api_path("/auth/register"))
        .json(&json!({
            "email": "bob@acme.test",
            "password": TEST_PASSWORD,
            "role": "TEAM_LEAD",
            "organizationName": "Nowhere",
        }))
        .await;
    assert_eq!(res.status_code(), 400);

    let res = client
        .post(&api_path("/auth/register"))
        .json(&json!({
            "email": "short@acme.test",
            "password": "123",
            "role": "INDIVIDUAL",
        }))
        .await;
    assert_eq!(res.status_code(), 400);
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let app = helpers::setup_test_app().await;
    let client = app.client();
    let user = register_individual(client, "dana@example.test").await;

    let res = client
        .post(&api_path("/auth/forgot"))
        .json(&json!({ "email": user.email }))
        .await;
    assert_eq!(res.status_code(), 200);

    // Unknown addresses get the same answer and no mail
    let res = client
        .post(&api_path("/auth/forgot"))
        .json(&json!({ "email": "ghost@example.test" }))
        .await;
    assert_eq!(res.status_code(), 200);
    assert!(app
        .mailer
        .sent()
        .iter()
        .all(|m| m.to != "ghost@example.test"));

    let token = app
        .mailer
        .last_reset_token(&user.email)
        .expect("reset mail with token");

    let res = client
        .post(&api_path("/auth/reset"))
        .json(&json!({ "token": token, "password": "brand-new-pass" }))
        .await;
    assert_eq!(res.status_code(), 200);

    let res = client
        .post(&api_path("/auth/reset"))
        .json(&json!({ "token": token, "password": "another-pass" }))
        .await;
    assert_eq!(res.status_code(), 400);

    login(client, &user.email, "brand-new-pass").await;
    let res = client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": user.email, "password": TEST_PASSWORD }))
        .await;
    assert_eq!(res.status_code(), 401);
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = helpers::setup_test_app().await;
    let client = app.client();

    let res = client.get(&api_path("/projects")).await;
    assert_eq!(res.status_code(), 401);

    let res = client
        .get(&api_path("/projects"))
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(res.status_code(), 403);

    let res = client.get(&api_path("/health")).await;
    assert_eq!(res.status_code(), 200);
}

#[tokio::test]
async fn test_session_cookie_alone_does_not_authenticate() {
    let app = helpers::setup_test_app().await;
    let client = app.client();
    let user = register_individual(client, "dana@example.test").await;

    let res = client
        .get(&api_path("/users/me"))
        .add_header("Cookie", format!("token={}", user.token))
        .await;
    assert_eq!(res.status_code(), 401);

    let res = client
        .get(&api_path("/users/me"))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(res.status_code(), 200);
}

#[tokio::test]
async fn test_concurrent_team_leads_get_distinct_numbers() {
    let app = helpers::setup_test_app().await;
    let client = app.client();
    register_manager(client, "alice@acme.test", "Acme").await;

    let (bob, dave) = tokio::join!(
        register_team_lead(client, "bob@acme.test", "Acme"),
        register_team_lead(client, "dave@acme.test", "Acme"),
    );

    let mut numbers = Vec::new();
    for lead in [&bob, &dave] {
        let me: Value = client
            .get(&api_path("/users/me"))
            .add_header("Authorization", lead.bearer())
            .await
            .json();
        numbers.push(me["tlIdWithinOrg"].as_i64().expect("tlIdWithinOrg"));
    }
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2]);
}
