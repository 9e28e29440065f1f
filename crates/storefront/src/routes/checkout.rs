//! Checkout route handlers.
//!
//! Checkout turns the session cart into an order. The shipping address is
//! validated locally first; an incomplete form never reaches the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use threadline_core::{PlaceOrder, ShippingAddress};
use tower_sessions::Session;
use tracing::instrument;

use super::auth::reauthenticate;
use super::cart::CartView;
use super::layout::Layout;
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireCustomer;
use crate::models::{CartContext, CustomerSession, Flash};
use crate::state::AppState;

/// Shipping form data. Also used to refill the form after a rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

impl CheckoutForm {
    fn prefilled(customer: &CustomerSession) -> Self {
        Self {
            full_name: customer.user.name.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    fn address(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.clone(),
            address_line1: self.address_line1.clone(),
            address_line2: Some(self.address_line2.clone()),
            city: self.city.clone(),
            state: Some(self.state.clone()),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            phone: Some(self.phone.clone()),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub error: Option<String>,
}

async fn render(
    session: &Session,
    customer: &CustomerSession,
    cart: &CartContext,
    form: CheckoutForm,
    error: Option<String>,
) -> CheckoutTemplate {
    CheckoutTemplate {
        layout: Layout::load(session, Some(customer)).await,
        cart: CartView::from(cart),
        form,
        error,
    }
}

/// Display the checkout form.
#[instrument(skip(session, customer))]
pub async fn show(
    session: Session,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Response> {
    let cart = CartContext::load(&session).await?;
    if cart.is_empty() {
        Flash::error("Your cart is empty.").push(&session).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = CheckoutForm::prefilled(&customer);
    Ok(render(&session, &customer, &cart, form, None)
        .await
        .into_response())
}

/// Place the order.
#[instrument(skip(state, session, customer, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let cart = CartContext::load(&session).await?;

    let request = match PlaceOrder::new(cart.order_items(), form.address()) {
        Ok(request) => request,
        Err(e) if cart.is_empty() => {
            tracing::debug!("Checkout with empty cart: {e}");
            Flash::error("Your cart is empty.").push(&session).await;
            return Ok(Redirect::to("/cart").into_response());
        }
        Err(e) => {
            let page = render(&session, &customer, &cart, form, Some(e.to_string())).await;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.api().place_order(customer.token(), &request).await {
        Ok(order) => {
            CartContext::clear(&session).await?;
            tracing::info!(order_id = %order.id, order_number = %order.order_number, "Order placed");
            Flash::success(format!("Thank you! Order {} has been placed.", order.order_number))
                .push(&session)
                .await;
            Ok(Redirect::to(&format!("/account/orders/{}", order.id)).into_response())
        }
        Err(ApiError::Unauthorized(_)) => Ok(reauthenticate(&session, "/checkout").await),
        Err(e) => {
            let status = if e.is_server_error() {
                tracing::error!("Failed to place order: {e}");
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            let page = render(&session, &customer, &cart, form, Some(e.user_message())).await;
            Ok((status, page).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_optional_fields_are_dropped() {
        let form = CheckoutForm {
            full_name: "Ada".to_string(),
            address_line1: "1 Way".to_string(),
            city: "London".to_string(),
            postal_code: "N1".to_string(),
            country: "GB".to_string(),
            ..CheckoutForm::default()
        };
        let address = form.address().validated();
        assert!(address.is_ok_and(|a| a.phone.is_none() && a.address_line2.is_none()));
    }

    #[test]
    fn test_missing_city_is_rejected() {
        let form = CheckoutForm {
            full_name: "Ada".to_string(),
            address_line1: "1 Way".to_string(),
            postal_code: "N1".to_string(),
            country: "GB".to_string(),
            ..CheckoutForm::default()
        };
        assert!(form.address().validated().is_err_and(|e| e.field() == "city"));
    }
}
