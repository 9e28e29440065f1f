//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use threadline_core::ProductId;
use tower_sessions::Session;
use tracing::instrument;

use super::auth::reauthenticate;
use super::layout::Layout;
use super::products::ProductCardView;
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireCustomer;
use crate::models::Flash;
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/wishlist.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    pub items: Vec<ProductCardView>,
    pub error: Option<String>,
}

/// Wishlist form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: ProductId,
    /// Page to return to after the change.
    #[serde(default)]
    pub back: Option<String>,
}

/// Display the wishlist.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Response> {
    let (items, error) = match state.api().wishlist(customer.token()).await {
        Ok(items) => (items.iter().map(ProductCardView::from).collect(), None),
        Err(ApiError::Unauthorized(_)) => {
            return Ok(reauthenticate(&session, "/account/wishlist").await);
        }
        Err(e) => {
            tracing::error!("Failed to fetch wishlist: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };

    Ok(WishlistTemplate {
        layout: Layout::load(&session, Some(&customer)).await,
        items,
        error,
    }
    .into_response())
}

fn back_to(form: &WishlistForm) -> String {
    super::auth::safe_next(form.back.as_deref().or(Some("/account/wishlist")))
}

/// Add a product to the wishlist.
#[instrument(skip(state, session, customer))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let back = back_to(&form);
    match state.api().add_to_wishlist(customer.token(), form.product_id).await {
        Ok(_) => Flash::success("Saved to your wishlist.").push(&session).await,
        Err(ApiError::Unauthorized(_)) => return Ok(reauthenticate(&session, &back).await),
        Err(e) => {
            tracing::warn!("Failed to add to wishlist: {e}");
            Flash::error(e.user_message()).push(&session).await;
        }
    }
    Ok(Redirect::to(&back).into_response())
}

/// Remove a product from the wishlist.
#[instrument(skip(state, session, customer))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Form(form): Form<WishlistForm>,
) -> Result<Response> {
    let back = back_to(&form);
    match state
        .api()
        .remove_from_wishlist(customer.token(), form.product_id)
        .await
    {
        Ok(_) => Flash::success("Removed from your wishlist.").push(&session).await,
        Err(ApiError::Unauthorized(_)) => return Ok(reauthenticate(&session, &back).await),
        Err(e) => {
            tracing::warn!("Failed to remove from wishlist: {e}");
            Flash::error(e.user_message()).push(&session).await;
        }
    }
    Ok(Redirect::to(&back).into_response())
}
