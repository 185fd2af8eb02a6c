//! `POST /api/v1/create-nums-row/` through the full router.

use axum::http::StatusCode;
use saraphan_integration_tests::TestApp;
use serde_json::json;

const PATH: &str = "/api/v1/create-nums-row/";

#[tokio::test]
async fn test_sequence() {
    let app = TestApp::new();

    for (number, expected) in [(1, "1"), (2, "122"), (5, "122333444455555")] {
        let response = app.post(PATH, &json!({ "number": number }), None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({ "number_sequence": expected }));
    }
}

#[tokio::test]
async fn test_sequence_needs_no_authentication() {
    let app = TestApp::new();
    let response = app.post(PATH, &json!({"number": "3"}), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["number_sequence"], "122333");
}

#[tokio::test]
async fn test_non_positive_number() {
    let app = TestApp::new();

    for number in [0, -4] {
        let response = app.post(PATH, &json!({ "number": number }), None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body,
            json!({"number": ["Field 'number' must be a positive integer."]})
        );
    }
}

#[tokio::test]
async fn test_missing_or_malformed_number() {
    let app = TestApp::new();

    let response = app.post(PATH, &json!({}), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({"number": ["This field is required."]}));

    let response = app.post(PATH, &json!({"number": "five"}), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({"number": ["A valid integer is required."]}));
}

#[tokio::test]
async fn test_number_above_ceiling() {
    let app = TestApp::new();
    let response = app.post(PATH, &json!({"number": 1001}), None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({"number": ["Ensure this value is less than or equal to 1000."]})
    );
}
