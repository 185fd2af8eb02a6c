//! Shopping cart through the full router.

use axum::http::StatusCode;
use saraphan_integration_tests::{PASSWORD, TestApp};
use serde_json::json;

const CART: &str = "/api/v1/shopping-cart/";
const CLEAR: &str = "/api/v1/shopping-cart/clear_shopping_cart/";

#[tokio::test]
async fn test_cart_lifecycle() {
    let app = TestApp::seeded().await;
    let token = app.access_token().await;

    let response = app.get(CART, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"total_goods": 0, "total_sum": 0, "goods": []})
    );

    let response = app
        .post(
            CART,
            &json!({"goods": [{"good": 1, "amount": 10}, {"good": 2, "amount": 20}]}),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.body,
        json!({
            "total_goods": 2,
            "total_sum": 50,
            "goods": [
                {"good": "Товар 1", "price": 1, "amount": 10},
                {"good": "Товар 2", "price": 2, "amount": 20}
            ]
        })
    );

    // Replacing drops good 2 entirely
    let response = app
        .post(
            CART,
            &json!({"goods": [{"good": 1, "amount": 20}, {"good": 3, "amount": 10}]}),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["total_sum"], 50);
    assert_eq!(
        response.body["goods"],
        json!([
            {"good": "Товар 1", "price": 1, "amount": 20},
            {"good": "Товар 3", "price": 3, "amount": 10}
        ])
    );

    let response = app.get(CART, Some(&token)).await;
    assert_eq!(response.body["total_goods"], 2);
    assert_eq!(response.body["total_sum"], 50);

    let response = app.post_empty(CLEAR, Some(&token)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_null());

    let response = app.get(CART, Some(&token)).await;
    assert_eq!(
        response.body,
        json!({"total_goods": 0, "total_sum": 0, "goods": []})
    );

    // Clearing an empty cart is fine
    let response = app.post_empty(CLEAR, Some(&token)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_cart_requires_authentication() {
    let app = TestApp::seeded().await;

    let response = app.get(CART, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"detail": "Authentication credentials were not provided."})
    );
    assert!(response.headers.contains_key("www-authenticate"));

    let response = app
        .post(CART, &json!({"goods": [{"good": 1, "amount": 1}]}), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.post_empty(CLEAR, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let app = TestApp::seeded().await;
    let (_, refresh) = app.login("auth_user", PASSWORD).await;

    for token in ["not-a-jwt", refresh.as_str()] {
        let response = app.get(CART, Some(token)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["code"], "token_not_valid");
    }
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let app = TestApp::seeded().await;
    app.seed("users:\n  - { username: other_user, password: \"!other_PASSWORD_2!\" }\n")
        .await;

    let first = app.access_token().await;
    let (second, _) = app.login("other_user", "!other_PASSWORD_2!").await;

    app.post(CART, &json!({"goods": [{"good": 1, "amount": 5}]}), Some(&first))
        .await;

    let response = app.get(CART, Some(&second)).await;
    assert_eq!(response.body["total_goods"], 0);

    app.post_empty(CLEAR, Some(&second)).await;
    let response = app.get(CART, Some(&first)).await;
    assert_eq!(response.body["total_sum"], 5);
}

#[tokio::test]
async fn test_replace_validation_errors() {
    let app = TestApp::seeded().await;
    let token = app.access_token().await;

    let cases = [
        (json!({}), json!({"goods": ["This field is required."]})),
        (
            json!({"goods": []}),
            json!({"goods": [{
                "good": ["This field is required."],
                "amount": ["This field is required."]
            }]}),
        ),
        (
            json!({"goods": [{"good": 1, "amount": 1}, {"good": 2, "amount": 0}]}),
            json!({"goods": [{}, {"amount": ["Ensure this value is greater than or equal to 1."]}]}),
        ),
        (
            json!({"goods": [{"good": 99, "amount": 1}]}),
            json!({"goods": [{"good": ["Invalid pk \"99\" - object does not exist."]}]}),
        ),
        (
            json!({"goods": [{"good": 1, "amount": 1}, {"good": 1, "amount": 2}]}),
            json!({"goods": [{"good": ["This field must be unique."]}]}),
        ),
    ];

    for (body, expected) in cases {
        let response = app.post(CART, &body, Some(&token)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.body, expected, "{body}");
    }
}

#[tokio::test]
async fn test_failed_replace_keeps_previous_cart() {
    let app = TestApp::seeded().await;
    let token = app.access_token().await;

    app.post(CART, &json!({"goods": [{"good": 3, "amount": 2}]}), Some(&token))
        .await;

    let response = app
        .post(
            CART,
            &json!({"goods": [{"good": 1, "amount": 1}, {"good": 99, "amount": 1}]}),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.get(CART, Some(&token)).await;
    assert_eq!(
        response.body,
        json!({
            "total_goods": 1,
            "total_sum": 6,
            "goods": [{"good": "Товар 3", "price": 3, "amount": 2}]
        })
    );
}

#[tokio::test]
async fn test_malformed_json() {
    let app = TestApp::seeded().await;
    let token = app.access_token().await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri(CART)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"goods\": ["))
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let detail = response.body["detail"].as_str().unwrap();
    assert!(detail.starts_with("JSON parse error - "), "{detail}");
}

#[tokio::test]
async fn test_cart_line_route_not_allowed() {
    let app = TestApp::seeded().await;
    let token = app.access_token().await;

    let response = app.get("/api/v1/shopping-cart/1/", Some(&token)).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.body, json!({"detail": "Method \"GET\" not allowed."}));
}

#[tokio::test]
async fn test_cart_line_route_requires_authentication() {
    let app = TestApp::seeded().await;

    let response = app.get("/api/v1/shopping-cart/1/", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"detail": "Authentication credentials were not provided."})
    );

    let response = app.post_empty("/api/v1/shopping-cart/1/", Some("not-a-jwt")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_repeated_replace_is_idempotent() {
    let app = TestApp::seeded().await;
    let token = app.access_token().await;
    let body = json!({"goods": [{"good": 1, "amount": 2}, {"good": 2, "amount": 3}]});

    let first = app.post(CART, &body, Some(&token)).await;
    let second = app.post(CART, &body, Some(&token)).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(second.status, StatusCode::CREATED);
    assert_eq!(first.body, second.body);
    assert_eq!(first.body["total_goods"], 2);
    assert_eq!(first.body["total_sum"], 8);

    let response = app.get(CART, Some(&token)).await;
    assert_eq!(response.body, first.body);
}

#[tokio::test]
async fn test_integral_float_amount_accepted() {
    let app = TestApp::seeded().await;
    let token = app.access_token().await;

    let response = app
        .post(CART, &json!({"goods": [{"good": 2, "amount": 2.0}]}), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["total_sum"], 4);

    let response = app
        .post(CART, &json!({"goods": [{"good": 2, "amount": 2.5}]}), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({"goods": [{"amount": ["A valid integer is required."]}]})
    );
}

#[tokio::test]
async fn test_deactivated_user_token_rejected() {
    use saraphan_core::Username;

    let app = TestApp::seeded().await;
    let token = app.access_token().await;

    app.state()
        .store()
        .set_user_active(&Username::parse("auth_user").unwrap(), false)
        .await
        .unwrap();

    let response = app.get(CART, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "user_inactive");
}
