//! Admin sign-in and variant image editing against a mocked backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;
use threadline_integration_tests::{TestClient, admin, auth_payload, red_blue_product};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login(server: &MockServer, role: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_payload(role)))
        .mount(server)
        .await;
}

async fn mount_product(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/admin/products/3"))
        .and(header("authorization", "Bearer admin-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"product": red_blue_product()}})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(server)
        .await;
}

async fn signed_in_admin(server: &MockServer) -> TestClient {
    mount_login(server, "admin").await;
    let mut client = admin(server);
    let response = client
        .post_form("/auth/login", "email=ada%40example.com&password=secret")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));
    client
}

// ============================================================================
// Sign-in
// ============================================================================

#[tokio::test]
async fn test_customer_account_cannot_sign_in() {
    let server = MockServer::start().await;
    mount_login(&server, "customer").await;
    let mut client = admin(&server);

    let response = client
        .post_form("/auth/login", "email=ada%40example.com&password=secret")
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.contains("does not have admin access"));

    let products = client.get("/products").await;
    assert_eq!(products.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_wrong_password_rerenders_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let response = admin(&server)
        .post_form("/auth/login", "email=ada%40example.com&password=nope")
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Invalid email or password."));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = MockServer::start().await;
    let mut client = signed_in_admin(&server).await;

    let login_page = client.get("/auth/login").await;
    assert_eq!(login_page.location(), Some("/"));

    let response = client.post_form("/auth/logout", "").await;
    assert_eq!(response.location(), Some("/auth/login"));

    let dashboard = client.get("/").await;
    assert_eq!(dashboard.status, StatusCode::SEE_OTHER);
    assert_eq!(dashboard.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_dashboard_shows_order_and_product_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"orders": [], "pagination": {"page": 1, "limit": 20, "total": 0, "pages": 1}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"products": [], "pagination": {"page": 1, "limit": 20, "total": 12, "pages": 1}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let mut client = signed_in_admin(&server).await;

    let page = client.get("/").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"<span class="metric-value">12</span>"#));
    assert!(page.body.contains("No orders yet."));
}

// ============================================================================
// Variant images
// ============================================================================

#[tokio::test]
async fn test_edit_page_lists_variant_images_primary_first() {
    let server = MockServer::start().await;
    mount_product(&server).await;
    let mut client = signed_in_admin(&server).await;

    let page = client.get("/products/3").await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"id="variant-30""#));
    let front = page.body.find("https://bucket.test/variants/30/front.jpg").unwrap();
    let back = page.body.find("https://bucket.test/variants/30/back.jpg").unwrap();
    assert!(front < back);
}

#[tokio::test]
async fn test_set_primary_persists_new_order() {
    let server = MockServer::start().await;
    mount_product(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/variants/30/images"))
        .and(body_json(json!({"images": [
            {"id": 502, "order": 0, "isPrimary": true},
            {"id": 501, "order": 1, "isPrimary": false}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let mut client = signed_in_admin(&server).await;

    let fragment = client
        .post_form_htmx("/products/3/variants/30/images/1/primary", "")
        .await;

    assert_eq!(fragment.status, StatusCode::OK);
    assert!(!fragment.body.contains("<html"));
    let back = fragment.body.find("back.jpg").unwrap();
    let front = fragment.body.find("front.jpg").unwrap();
    assert!(back < front);
}

#[tokio::test]
async fn test_failed_sync_keeps_change_and_warns() {
    let server = MockServer::start().await;
    mount_product(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/variants/30/images"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let mut client = signed_in_admin(&server).await;

    let response = client
        .post_form("/products/3/variants/30/images/reorder", "from=1&to=0")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/products/3#variant-30"));

    // The edit page comes from the session draft, so the local order survives.
    let page = client.get("/products/3").await;
    assert!(page.body.contains("Change kept in this editor but not saved"));
    let back = page.body.find("back.jpg").unwrap();
    let front = page.body.find("front.jpg").unwrap();
    assert!(back < front);
}

#[tokio::test]
async fn test_removing_primary_deletes_and_promotes_next() {
    let server = MockServer::start().await;
    mount_product(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/images/501"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/variants/30/images"))
        .and(body_json(json!({"images": [
            {"id": 502, "order": 0, "isPrimary": true}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let mut client = signed_in_admin(&server).await;

    let fragment = client
        .post_form_htmx("/products/3/variants/30/images/0/delete", "")
        .await;

    assert_eq!(fragment.status, StatusCode::OK);
    assert!(!fragment.body.contains("front.jpg"));
    assert!(fragment.body.contains("back.jpg"));
}

#[tokio::test]
async fn test_out_of_range_index_makes_no_backend_call() {
    let server = MockServer::start().await;
    mount_product(&server).await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/variants/30/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;
    let mut client = signed_in_admin(&server).await;

    let response = client
        .post_form_htmx("/products/3/variants/30/images/9/primary", "")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_replaces_pending_slot_and_saves_order() {
    let server = MockServer::start().await;
    mount_product(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/admin/variants/31/images"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"image": {"id": 900, "url": "variants/31/new.png", "isPrimary": false, "order": 4}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/variants/31/images"))
        .and(body_json(json!({"images": [
            {"id": 900, "order": 0, "isPrimary": true}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let mut client = signed_in_admin(&server).await;

    let response = client
        .post_file(
            "/products/3/variants/31/images",
            "image",
            "new.png",
            "image/png",
            b"\x89PNG fake",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/products/3#variant-31"));

    let page = client.get("/products/3").await;
    assert!(page.body.contains("Image uploaded."));
    assert!(page.body.contains("https://bucket.test/variants/31/new.png"));
    assert!(!page.body.contains("Not uploaded"));
}

#[tokio::test]
async fn test_non_image_upload_is_refused_locally() {
    let server = MockServer::start().await;
    mount_product(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/admin/variants/31/images"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let mut client = signed_in_admin(&server).await;

    let response = client
        .post_file(
            "/products/3/variants/31/images",
            "image",
            "notes.txt",
            "text/plain",
            b"hello",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let page = client.get("/products/3").await;
    assert!(page.body.contains("Only image files can be uploaded."));
}
