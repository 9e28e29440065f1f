//! Account route handlers: order history, order detail, cancellation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use threadline_core::{CancelOrder, Order, OrderId, Pagination};
use tower_sessions::Session;
use tracing::instrument;

use super::auth::reauthenticate;
use super::empty_string_as_none;
use super::layout::Layout;
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireCustomer;
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Order list row display data.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub id: i64,
    pub order_number: String,
    pub status: String,
    pub placed_on: Option<String>,
    pub item_count: u32,
    pub total: String,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i64(),
            order_number: order.order_number.clone(),
            status: order.status.label().to_string(),
            placed_on: order.created_at.map(|d| d.format("%B %-d, %Y").to_string()),
            item_count: order.item_count(),
            total: order.total_price().to_string(),
        }
    }
}

/// Order line display data.
#[derive(Clone)]
pub struct OrderLineView {
    pub name: String,
    pub variant_label: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Tracking display data.
#[derive(Clone)]
pub struct TrackingView {
    pub carrier: Option<String>,
    pub number: Option<String>,
    pub url: Option<String>,
    pub estimated_delivery: Option<String>,
}

/// Shipping address display lines.
#[derive(Clone)]
pub struct AddressView {
    pub lines: Vec<String>,
}

/// Order detail display data.
#[derive(Clone)]
pub struct OrderDetailView {
    pub summary: OrderSummaryView,
    pub lines: Vec<OrderLineView>,
    pub address: Option<AddressView>,
    pub tracking: Option<TrackingView>,
    pub cancellable: bool,
    pub cancellation_reason: Option<String>,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        let lines = order
            .items
            .iter()
            .map(|item| OrderLineView {
                name: item.product_name.clone(),
                variant_label: item.variant_label.clone(),
                quantity: item.quantity,
                price: threadline_core::Price::usd(item.price).to_string(),
                line_total: item.line_total().to_string(),
            })
            .collect();

        let address = order.shipping_address.as_ref().map(|a| AddressView {
            lines: [
                Some(a.full_name.clone()),
                Some(a.address_line1.clone()),
                a.address_line2.clone(),
                Some(
                    [Some(a.city.as_str()), a.state.as_deref(), Some(a.postal_code.as_str())]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                Some(a.country.clone()),
            ]
            .into_iter()
            .flatten()
            .collect(),
        });

        let tracking = order
            .tracking
            .as_ref()
            .filter(|_| order.status.has_shipped())
            .map(|t| TrackingView {
                carrier: t.carrier.clone(),
                number: t.tracking_number.clone(),
                url: t.tracking_url.clone(),
                estimated_delivery: t
                    .estimated_delivery
                    .map(|d| d.format("%B %-d, %Y").to_string()),
            });

        Self {
            summary: OrderSummaryView::from(order),
            lines,
            address,
            tracking,
            cancellable: order.status.is_cancellable(),
            cancellation_reason: order.cancellation_reason.clone(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderSummaryView>,
    pub pagination: Pagination,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub layout: Layout,
    pub order: OrderDetailView,
}

/// Order history query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
}

/// Cancel form data.
#[derive(Debug, Deserialize)]
pub struct CancelForm {
    #[serde(default)]
    pub reason: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display order history.
#[instrument(skip(state, session, customer))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Query(query): Query<OrdersQuery>,
) -> Result<Response> {
    let page = match state
        .api()
        .orders(customer.token(), query.page.unwrap_or(1))
        .await
    {
        Ok(page) => page,
        Err(ApiError::Unauthorized(_)) => {
            return Ok(reauthenticate(&session, "/account/orders").await);
        }
        Err(e) => return Err(e.into()),
    };

    Ok(OrdersTemplate {
        layout: Layout::load(&session, Some(&customer)).await,
        orders: page.items.iter().map(OrderSummaryView::from).collect(),
        pagination: page.pagination,
    }
    .into_response())
}

/// Display a single order.
#[instrument(skip(state, session, customer), fields(order_id = %id))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let order = match state.api().order(customer.token(), id).await {
        Ok(order) => order,
        Err(ApiError::Unauthorized(_)) => {
            return Ok(reauthenticate(&session, &format!("/account/orders/{id}")).await);
        }
        Err(e) => return Err(e.into()),
    };

    Ok(OrderTemplate {
        layout: Layout::load(&session, Some(&customer)).await,
        order: OrderDetailView::from(&order),
    }
    .into_response())
}

/// Cancel an order.
///
/// A blank reason is refused here and never reaches the backend.
#[instrument(skip(state, session, customer, form), fields(order_id = %id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(customer): RequireCustomer,
    Path(id): Path<OrderId>,
    Form(form): Form<CancelForm>,
) -> Result<Response> {
    let detail = format!("/account/orders/{id}");

    let request = match CancelOrder::new(&form.reason) {
        Ok(request) => request,
        Err(_) => {
            Flash::error("Please tell us why you are cancelling this order.")
                .push(&session)
                .await;
            return Ok(Redirect::to(&detail).into_response());
        }
    };

    match state.api().cancel_order(customer.token(), id, &request).await {
        Ok(message) => {
            tracing::info!("Order cancelled");
            Flash::success(message.unwrap_or_else(|| "Your order has been cancelled.".to_string()))
                .push(&session)
                .await;
        }
        Err(ApiError::Unauthorized(_)) => return Ok(reauthenticate(&session, &detail).await),
        Err(e) => {
            if e.is_server_error() {
                tracing::error!("Failed to cancel order: {e}");
            }
            Flash::error(e.user_message()).push(&session).await;
        }
    }

    Ok(Redirect::to(&detail).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn order(status: &str) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "orderNumber": "TL-0007",
            "status": status,
            "total": "55.00",
            "items": [
                {"productName": "Linen Shirt", "variantLabel": "Red / M", "price": "27.50", "quantity": 2}
            ],
            "shippingAddress": {
                "fullName": "Ada Lovelace",
                "addressLine1": "1 Analytical Way",
                "city": "London",
                "postalCode": "N1",
                "country": "GB"
            },
            "tracking": {"carrier": "DHL", "trackingNumber": "123"},
            "createdAt": "2026-03-04T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_pending_order_is_cancellable_without_tracking() {
        let view = OrderDetailView::from(&order("PENDING"));
        assert!(view.cancellable);
        assert!(view.tracking.is_none());
        assert_eq!(view.summary.placed_on.as_deref(), Some("March 4, 2026"));
        assert_eq!(view.lines[0].line_total, "$55.00");
        assert_eq!(
            view.address.unwrap().lines,
            vec!["Ada Lovelace", "1 Analytical Way", "London, N1", "GB"]
        );
    }

    #[test]
    fn test_shipped_order_shows_tracking() {
        let view = OrderDetailView::from(&order("SHIPPED"));
        assert!(!view.cancellable);
        assert_eq!(view.tracking.unwrap().carrier.as_deref(), Some("DHL"));
    }
}
