//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Dashboard
//! GET  /                       - Dashboard overview
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login against the backend API (admin role required)
//! POST /auth/logout            - Logout
//!
//! # Products
//! GET  /products               - Product listing (search, page)
//! GET  /products/new           - New product form
//! POST /products               - Create product
//! GET  /products/{id}          - Edit form (loads the aggregate into the session draft)
//! POST /products/{id}          - Save the whole aggregate
//! POST /products/{id}/delete   - Delete product
//!
//! # Variant images (optimistic, synced after the draft changes)
//! POST /products/{id}/variants/{variant_id}/images                  - Upload (multipart)
//! POST /products/{id}/variants/{variant_id}/images/{index}/primary  - Set primary
//! POST /products/{id}/variants/{variant_id}/images/{index}/delete   - Remove
//! POST /products/{id}/variants/{variant_id}/images/reorder          - Move (from, to)
//!
//! # Orders
//! GET  /orders                 - Order listing (status, page)
//! GET  /orders/{id}            - Order detail
//! POST /orders/{id}/status     - Change status, attach tracking
//!
//! # Catalog lists (kind = categories | colors | sizes)
//! GET  /catalog/{kind}         - List entries
//! POST /catalog/{kind}         - Create entry
//! POST /catalog/{kind}/{id}/delete - Delete entry
//! ```

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod layout;
pub mod orders;
pub mod products;

use std::fmt::Display;
use std::str::FromStr;

use askama::Template;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Html,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};

use crate::state::AppState;

/// Largest accepted image upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Deserialize empty strings as None for optional query and form fields.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Whether the request was issued by htmx.
pub(crate) fn is_htmx(headers: &axum::http::HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Render a template, falling back to a plain error body.
pub(crate) fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{id}", get(products::edit).post(products::update))
        .route("/{id}/delete", post(products::delete))
        .route(
            "/{id}/variants/{variant_id}/images",
            post(products::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/{id}/variants/{variant_id}/images/reorder",
            post(products::reorder_image),
        )
        .route(
            "/{id}/variants/{variant_id}/images/{index}/primary",
            post(products::set_primary_image),
        )
        .route(
            "/{id}/variants/{variant_id}/images/{index}/delete",
            post(products::delete_image),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create the catalog list routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(catalog::index).post(catalog::create))
        .route("/{kind}/{id}/delete", post(catalog::delete))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/catalog", catalog_routes())
}
