//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (concurrent product rows)
//! GET  /health                    - Health check
//!
//! # Products
//! GET  /products                  - Product listing with filters
//! GET  /products/fragment         - Listing grid fragment (HTMX, stale responses dropped)
//! GET  /products/{slug}           - Product detail (?color=&size=&changed=)
//!
//! # Cart (session-held)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add a variant
//! POST /cart/update               - Set a line quantity
//! POST /cart/remove               - Remove a line
//!
//! # Checkout (requires auth)
//! GET  /checkout                  - Shipping form
//! POST /checkout                  - Place order
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! POST /auth/logout               - Logout action
//!
//! # Account (requires auth)
//! GET  /account/orders            - Order history
//! GET  /account/orders/{id}       - Order detail with tracking
//! POST /account/orders/{id}/cancel - Cancel with reason
//! GET  /account/wishlist          - Wishlist
//! POST /account/wishlist/add      - Add product
//! POST /account/wishlist/remove   - Remove product
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod layout;
pub mod products;
pub mod wishlist;

use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer};

use crate::state::AppState;

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

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/fragment", get(products::fragment))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/orders/{id}/cancel", post(account::cancel_order))
        .route("/wishlist", get(wishlist::show))
        .route("/wishlist/add", post(wishlist::add))
        .route("/wishlist/remove", post(wishlist::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::empty_string_as_none;

    #[derive(Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        page: Option<u32>,
    }

    #[test]
    fn test_empty_string_as_none() {
        let params: Params = serde_json::from_str(r#"{"page": ""}"#).unwrap();
        assert_eq!(params.page, None);
        let params: Params = serde_json::from_str(r#"{"page": " 3 "}"#).unwrap();
        assert_eq!(params.page, Some(3));
        let params: Params = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, None);
        assert!(serde_json::from_str::<Params>(r#"{"page": "x"}"#).is_err());
    }
}
