//! Catalog endpoints through the full router.

use axum::http::StatusCode;
use saraphan_integration_tests::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_list_categories() {
    let app = TestApp::seeded().await;
    let response = app.get("/api/v1/categories/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({
            "count": 3,
            "next": null,
            "previous": null,
            "results": [
                {"id": 1, "name": "Категория 1", "slug": "category-1", "image": null},
                {"id": 2, "name": "Категория 2", "slug": "category-2", "image": null},
                {"id": 3, "name": "Категория 3", "slug": "category-3", "image": null}
            ]
        })
    );
}

#[tokio::test]
async fn test_list_subcategories_nests_category() {
    let app = TestApp::seeded().await;
    let response = app.get("/api/v1/subcategories/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 3);
    assert_eq!(
        response.body["results"][0],
        json!({
            "id": 1,
            "name": "Подкатегория 1",
            "slug": "subcategory-1",
            "category": {"id": 1, "name": "Категория 1", "slug": "category-1", "image": null},
            "image": null
        })
    );
}

#[tokio::test]
async fn test_list_goods() {
    let app = TestApp::seeded().await;
    let response = app.get("/api/v1/goods/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["results"][1],
        json!({
            "id": 2,
            "name": "Товар 2",
            "slug": "good-2",
            "price": 2,
            "subcategory": {
                "id": 2,
                "name": "Подкатегория 2",
                "slug": "subcategory-2",
                "parent_category": "Категория 2"
            },
            "image_large": null,
            "image_medium": null,
            "image_small": null
        })
    );
}

#[tokio::test]
async fn test_detail_endpoints() {
    let app = TestApp::seeded().await;

    let response = app.get("/api/v1/categories/2/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["slug"], "category-2");

    let response = app.get("/api/v1/subcategories/3/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["category"]["id"], 3);

    let response = app.get("/api/v1/goods/1/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["price"], 1);
}

#[tokio::test]
async fn test_detail_not_found() {
    let app = TestApp::seeded().await;

    for path in [
        "/api/v1/categories/99/",
        "/api/v1/subcategories/99/",
        "/api/v1/goods/99/",
        "/api/v1/goods/abc/",
    ] {
        let response = app.get(path, None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(response.body, json!({"detail": "Not found."}), "{path}");
    }
}

#[tokio::test]
async fn test_images_render_as_absolute_urls() {
    let app = TestApp::new();
    app.seed(
        r"
categories:
  - { name: Pictured, slug: pictured, image: true }
subcategories:
  - { name: Sub, slug: sub, category: pictured }
goods:
  - { name: Good, slug: good, price: 10, subcategory: sub, images: true }
",
    )
    .await;

    let response = app.get("/api/v1/categories/1/", None).await;
    assert_eq!(
        response.body["image"],
        "http://127.0.0.1:8000/media/categories/pictured"
    );

    let response = app.get("/api/v1/goods/1/", None).await;
    assert_eq!(
        response.body["image_small"],
        "http://127.0.0.1:8000/media/goods/good_s"
    );
}

#[tokio::test]
async fn test_pagination_links() {
    let app = TestApp::new();
    let categories: String = (1..=25)
        .map(|i| format!("  - {{ name: \"Category {i:02}\", slug: category-{i:02} }}\n"))
        .collect();
    app.seed(&format!("categories:\n{categories}")).await;

    let response = app.get("/api/v1/categories/", None).await;
    assert_eq!(response.body["count"], 25);
    assert_eq!(
        response.body["next"],
        "http://127.0.0.1:8000/api/v1/categories/?page=2"
    );
    assert!(response.body["previous"].is_null());
    assert_eq!(response.body["results"].as_array().unwrap().len(), 10);

    let response = app.get("/api/v1/categories/?page=2", None).await;
    assert_eq!(
        response.body["previous"],
        "http://127.0.0.1:8000/api/v1/categories/"
    );
    assert_eq!(response.body["results"][0]["name"], "Category 11");

    let response = app.get("/api/v1/categories/?page=3", None).await;
    assert!(response.body["next"].is_null());
    assert_eq!(response.body["results"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_invalid_page() {
    let app = TestApp::seeded().await;

    for query in ["?page=2", "?page=0", "?page=abc"] {
        let response = app.get(&format!("/api/v1/goods/{query}"), None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{query}");
        assert_eq!(response.body, json!({"detail": "Invalid page."}));
    }
}

#[tokio::test]
async fn test_repeated_page_parameter_uses_last_value() {
    let app = TestApp::seeded().await;

    let response = app.get("/api/v1/goods/?page=1&page=1", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 3);

    let response = app.get("/api/v1/categories/?page=1&page=2", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"detail": "Invalid page."}));
}

#[tokio::test]
async fn test_empty_catalog_first_page() {
    let app = TestApp::new();
    let response = app.get("/api/v1/goods/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"count": 0, "next": null, "previous": null, "results": []})
    );
}

#[tokio::test]
async fn test_catalog_is_read_only() {
    let app = TestApp::seeded().await;
    let response = app
        .post("/api/v1/categories/", &json!({"name": "New"}), None)
        .await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}
