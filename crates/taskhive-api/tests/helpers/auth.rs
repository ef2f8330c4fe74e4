//! Account helpers: register through the API, then log in for a bearer token.

use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use super::api_path;

pub const TEST_PASSWORD: &str = "secret-pass";

/// Registered and logged-in account
pub struct TestUser {
    pub email: String,
    pub user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

fn uuid_field(value: &Value, key: &str) -> Option<Uuid> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// POST /auth/register with `body`, asserting 201, then log in.
pub async fn register(client: &TestServer, body: Value) -> TestUser {
    let email = body["email"].as_str().expect("email in body").to_string();
    let res = client.post(&api_path("/auth/register")).json(&body).await;
    assert_eq!(res.status_code(), 201, "register {}: {}", email, res.text());
    login(client, &email, TEST_PASSWORD).await
}

pub async fn login(client: &TestServer, email: &str, password: &str) -> TestUser {
    let res = client
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .await;
    assert_eq!(res.status_code(), 200, "login {}: {}", email, res.text());
    let body: Value = res.json();
    TestUser {
        email: email.to_string(),
        user_id: uuid_field(&body, "userId").expect("userId"),
        organization_id: uuid_field(&body, "organizationId"),
        token: body["token"].as_str().expect("token").to_string(),
    }
}

pub async fn register_manager(client: &TestServer, email: &str, org: &str) -> TestUser {
    register(
        client,
        json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": email.split('@').next(),
            "role": "MANAGER",
            "organizationName": org,
        }),
    )
    .await
}

pub async fn register_team_lead(client: &TestServer, email: &str, org: &str) -> TestUser {
    register(
        client,
        json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": email.split('@').next(),
            "role": "TEAM_LEAD",
            "organizationName": org,
        }),
    )
    .await
}

pub async fn register_member(client: &TestServer, email: &str, org: &str, tl_id: i32) -> TestUser {
    register(
        client,
        json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": email.split('@').next(),
            "role": "TEAM_MEMBER",
            "organizationName": org,
            "tlIdWithinOrg": tl_id,
        }),
    )
    .await
}

pub async fn register_individual(client: &TestServer, email: &str) -> TestUser {
    register(
        client,
        json!({
            "email": email,
            "password": TEST_PASSWORD,
            "role": "INDIVIDUAL",
        }),
    )
    .await
}
