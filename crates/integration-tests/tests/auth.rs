//! Token endpoints through the full router.

use axum::http::StatusCode;
use saraphan_integration_tests::{PASSWORD, TestApp, USERNAME};
use serde_json::json;

const CREATE: &str = "/api/v1/auth/token/create/";
const REFRESH: &str = "/api/v1/auth/token/refresh/";

#[tokio::test]
async fn test_create_token_pair() {
    let app = TestApp::seeded().await;
    let response = app
        .post(
            CREATE,
            &json!({"username": USERNAME, "password": PASSWORD}),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["access"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(response.body["refresh"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_bad_credentials() {
    let app = TestApp::seeded().await;

    for (username, password) in [(USERNAME, "wrong-password"), ("nobody", PASSWORD)] {
        let response = app
            .post(
                CREATE,
                &json!({"username": username, "password": password}),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body,
            json!({"detail": "No active account found with the given credentials"})
        );
    }
}

#[tokio::test]
async fn test_missing_fields() {
    let app = TestApp::seeded().await;

    let response = app.post(CREATE, &json!({}), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({
            "username": ["This field is required."],
            "password": ["This field is required."]
        })
    );

    let response = app.post(REFRESH, &json!({}), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({"refresh": ["This field is required."]}));
}

#[tokio::test]
async fn test_refresh_issues_working_access_token() {
    let app = TestApp::seeded().await;
    let (_, refresh) = app.login(USERNAME, PASSWORD).await;

    let response = app.post(REFRESH, &json!({"refresh": refresh}), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let access = response.body["access"].as_str().unwrap();

    let response = app.get("/api/v1/shopping-cart/", Some(access)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::seeded().await;
    let (access, _) = app.login(USERNAME, PASSWORD).await;

    for token in [access.as_str(), "garbage"] {
        let response = app.post(REFRESH, &json!({"refresh": token}), None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body,
            json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})
        );
    }
}

#[tokio::test]
async fn test_inactive_user_cannot_log_in() {
    let app = TestApp::new();
    app.seed("users:\n  - { username: retired, password: \"!user_PASSWORD_3!\", is_active: false }\n")
        .await;

    let response = app
        .post(
            CREATE,
            &json!({"username": "retired", "password": "!user_PASSWORD_3!"}),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
