//! Cart route handlers.
//!
//! The cart lives in the session. Adds from the product page use HTMX and
//! answer with the header count badge plus a `cart-updated` trigger.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use threadline_core::{Product, Variant, VariantId};
use tower_sessions::Session;
use tracing::instrument;

use super::is_htmx;
use super::layout::Layout;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalCustomer;
use crate::models::{CartContext, CartLine, Flash};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub variant_id: i64,
    pub slug: String,
    pub name: String,
    pub variant_label: Option<String>,
    pub quantity: u32,
    pub max_quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            variant_id: line.variant_id.as_i64(),
            slug: line.product_slug.clone(),
            name: line.product_name.clone(),
            variant_label: line.variant_label.clone(),
            quantity: line.quantity,
            max_quantity: line.max_quantity,
            price: line.price().to_string(),
            line_price: line.line_total().to_string(),
            image: line.image.clone(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&CartContext> for CartView {
    fn from(cart: &CartContext) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            subtotal: cart.subtotal().to_string(),
            item_count: cart.item_count(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    pub variant_id: VariantId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub variant_id: VariantId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Snapshot a variant into a cart line.
fn cart_line(product: &Product, variant: &Variant, quantity: u32) -> CartLine {
    CartLine {
        variant_id: variant.id,
        product_id: product.id,
        product_slug: product.slug.clone(),
        product_name: product.name.clone(),
        variant_label: product.variant_label(variant),
        unit_price: variant.price_point().current.amount,
        quantity,
        max_quantity: u32::try_from(variant.quantity.max(0)).unwrap_or(u32::MAX),
        image: variant
            .primary_image()
            .or_else(|| product.cover_image())
            .map(|img| img.url.clone()),
    }
}

/// Display cart page.
#[instrument(skip(session, customer))]
pub async fn show(
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
) -> Result<CartShowTemplate> {
    let cart = CartContext::load(&session).await?;

    Ok(CartShowTemplate {
        layout: Layout::load(&session, customer.as_ref()).await,
        cart: CartView::from(&cart),
    })
}

/// Add a variant to the cart.
///
/// Stock is re-checked against a fresh product fetch so a stale product
/// page cannot add a sold-out variant.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state.api().product(&form.slug).await?;
    let variant = product
        .variant(form.variant_id)
        .filter(|v| v.is_purchasable())
        .ok_or_else(|| AppError::BadRequest("That option is no longer available.".to_string()))?;

    let mut cart = CartContext::load(&session).await?;
    cart.add(cart_line(&product, variant, form.quantity.unwrap_or(1).max(1)));
    cart.save(&session).await?;

    tracing::info!(variant_id = %variant.id, "Added to cart");

    if is_htmx(&headers) {
        Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response())
    } else {
        Flash::success(format!("Added {} to your cart.", product.name))
            .push(&session)
            .await;
        Ok(Redirect::to("/cart").into_response())
    }
}

/// Set a line's quantity.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let mut cart = CartContext::load(&session).await?;
    if cart.update(form.variant_id, form.quantity) {
        cart.save(&session).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let mut cart = CartContext::load(&session).await?;
    if cart.remove(form.variant_id) {
        cart.save(&session).await?;
    }
    Ok(Redirect::to("/cart"))
}
