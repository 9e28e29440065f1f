//! Integration tests for Threadline.
//!
//! Both apps are driven in-process through their routers while the backend
//! REST API is played by a [`wiremock`] server, so no database or running
//! backend is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p threadline-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_*` - Shopper flows: variant selection, listing fragments, cart, orders
//! - `admin_*` - Back-office flows: sign-in, variant image editing

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

/// A router plus the session cookie it last handed out.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }
}

impl TestClient {
    #[must_use]
    pub const fn new(router: Router) -> Self {
        Self {
            router,
            cookie: None,
        }
    }

    /// Send a request, carrying the session cookie across calls.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    /// GET as htmx does it.
    pub async fn get_htmx(&mut self, uri: &str) -> TestResponse {
        self.send(
            Request::get(uri)
                .header("hx-request", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// POST an urlencoded form.
    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        self.send(form_request(uri, form).body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// POST an urlencoded form as htmx does it.
    pub async fn post_form_htmx(&mut self, uri: &str, form: &str) -> TestResponse {
        self.send(
            form_request(uri, form)
                .header("hx-request", "true")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }

    /// POST a single file as `multipart/form-data`.
    pub async fn post_file(
        &mut self,
        uri: &str,
        field: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> TestResponse {
        const BOUNDARY: &str = "threadline-test-boundary";
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

fn form_request(uri: &str, form: &str) -> axum::http::request::Builder {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::CONTENT_LENGTH, form.len())
}

/// Backend base URL on the mock server.
#[must_use]
pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// Storefront router wired to the mock backend.
#[must_use]
pub fn storefront(server: &MockServer) -> TestClient {
    use threadline_storefront::{app, config::StorefrontConfig, state::AppState};

    let api = api_base(server);
    let config = StorefrontConfig::from_lookup(|key| match key {
        "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
        "API_BASE_URL" => Some(api.clone()),
        "STORAGE_BASE_URL" => Some("https://bucket.test".to_string()),
        _ => None,
    })
    .unwrap();
    TestClient::new(app(AppState::new(config).unwrap()))
}

/// Admin router wired to the mock backend.
#[must_use]
pub fn admin(server: &MockServer) -> TestClient {
    use threadline_admin::{app, config::AdminConfig, state::AppState};

    let api = api_base(server);
    let config = AdminConfig::from_lookup(|key| match key {
        "ADMIN_BASE_URL" => Some("http://localhost:3001".to_string()),
        "API_BASE_URL" => Some(api.clone()),
        "STORAGE_BASE_URL" => Some("https://bucket.test".to_string()),
        _ => None,
    })
    .unwrap();
    TestClient::new(app(AppState::new(config).unwrap()))
}

/// Login response for a user with `role`.
#[must_use]
pub fn auth_payload(role: &str) -> Value {
    json!({
        "data": {
            "token": format!("{role}-token"),
            "user": {"id": 1, "email": "ada@example.com", "name": "Ada", "role": role}
        }
    })
}

/// A shirt in Red/S and Blue/M, with two images on the Red variant.
#[must_use]
pub fn red_blue_product() -> Value {
    json!({
        "id": 3,
        "name": "Linen Shirt",
        "slug": "linen-shirt",
        "description": "Breathable linen.",
        "price": "30.00",
        "isActive": true,
        "colors": [
            {"id": 1, "name": "Red", "displayOrder": 1, "hexCode": "#cc0000"},
            {"id": 2, "name": "Blue", "displayOrder": 2}
        ],
        "sizes": [
            {"id": 10, "name": "S", "displayOrder": 1},
            {"id": 11, "name": "M", "displayOrder": 2}
        ],
        "variants": [
            {
                "id": 30, "productId": 3, "colorId": 1, "sizeId": 10,
                "price": "30.00", "quantity": 4, "isActive": true,
                "images": [
                    {"id": 501, "url": "variants/30/front.jpg", "isPrimary": true, "order": 0},
                    {"id": 502, "url": "variants/30/back.jpg", "isPrimary": false, "order": 1}
                ]
            },
            {
                "id": 31, "productId": 3, "colorId": 2, "sizeId": 11,
                "price": "32.00", "quantity": 2, "isActive": true,
                "images": []
            }
        ]
    })
}
