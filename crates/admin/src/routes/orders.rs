//! Orders management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use threadline_core::{Order, OrderId, OrderStatus, Pagination, Price, Tracking, UpdateOrderStatus, validation};
use tower_sessions::Session;
use tracing::instrument;

use super::empty_string_as_none;
use super::layout::Layout;
use super::render;
use crate::api::OrderListQuery;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderIndexParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<OrderStatus>,
}

/// Status badge CSS class.
#[must_use]
pub const fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending | OrderStatus::Processing => "badge-warning",
        OrderStatus::Paid => "badge-info",
        OrderStatus::Shipped | OrderStatus::Delivered => "badge-success",
        OrderStatus::Cancelled | OrderStatus::Refunded => "badge-muted",
    }
}

/// Order row for tables.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: i64,
    pub number: String,
    pub customer: String,
    pub total: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub item_count: u32,
    pub created_at: String,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i64(),
            number: order.order_number.clone(),
            customer: order
                .shipping_address
                .as_ref()
                .map_or_else(|| "Unknown".to_string(), |a| a.full_name.clone()),
            total: order.total_price().to_string(),
            status: order.status.label(),
            status_class: status_class(order.status),
            item_count: order.item_count(),
            created_at: order
                .created_at
                .map_or_else(String::new, |d| d.format("%b %-d, %Y %H:%M").to_string()),
        }
    }
}

/// Status filter option.
#[derive(Debug, Clone)]
pub struct StatusOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn status_options(current: Option<OrderStatus>) -> Vec<StatusOptionView> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusOptionView {
            value: status.as_str(),
            label: status.label(),
            selected: current == Some(status),
        })
        .collect()
}

/// Orders list template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRowView>,
    pub statuses: Vec<StatusOptionView>,
    pub status: String,
    pub pagination: Pagination,
    pub error: Option<String>,
}

/// Order list handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<OrderIndexParams>,
) -> Html<String> {
    let query = OrderListQuery {
        page: params.page.unwrap_or(1),
        status: params.status,
    };

    let (orders, pagination, error) = match state.api().orders(admin.token(), query).await {
        Ok(page) => (
            page.items.iter().map(OrderRowView::from).collect(),
            page.pagination,
            None,
        ),
        Err(e) => {
            tracing::error!("Failed to fetch orders: {e}");
            (Vec::new(), Pagination::default(), Some(e.summary()))
        }
    };

    render(&OrdersIndexTemplate {
        layout: Layout::load(&session, Some(&admin), "/orders").await,
        orders,
        statuses: status_options(params.status),
        status: params.status.map(OrderStatus::as_str).unwrap_or_default().to_string(),
        pagination,
        error,
    })
}

/// Order line for the detail page.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub variant_label: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Order detail template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderRowView,
    pub lines: Vec<OrderLineView>,
    pub address: Vec<String>,
    pub tracking: Option<Tracking>,
    pub cancellation_reason: Option<String>,
    pub statuses: Vec<StatusOptionView>,
}

/// Order detail handler.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Html<String>> {
    let order = state.api().order(admin.token(), id).await?;

    let lines = order
        .items
        .iter()
        .map(|item| OrderLineView {
            name: item.product_name.clone(),
            variant_label: item.variant_label.clone(),
            quantity: item.quantity,
            price: Price::usd(item.price).to_string(),
            line_total: item.line_total().to_string(),
        })
        .collect();

    let address = order
        .shipping_address
        .as_ref()
        .map(|a| {
            [
                Some(a.full_name.clone()),
                Some(a.address_line1.clone()),
                a.address_line2.clone(),
                Some(format!("{} {}", a.city, a.postal_code)),
                a.state.clone(),
                Some(a.country.clone()),
                a.phone.clone(),
            ]
            .into_iter()
            .flatten()
            .collect()
        })
        .unwrap_or_default();

    Ok(render(&OrderShowTemplate {
        layout: Layout::load(&session, Some(&admin), "/orders").await,
        order: OrderRowView::from(&order),
        lines,
        address,
        tracking: order.tracking.clone(),
        cancellation_reason: order.cancellation_reason.clone(),
        statuses: status_options(Some(order.status)),
    }))
}

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

impl StatusForm {
    /// Build the update, attaching tracking only when some was entered.
    fn into_update(self) -> UpdateOrderStatus {
        let carrier = validation::optional(self.carrier.as_deref());
        let tracking_number = validation::optional(self.tracking_number.as_deref());
        let tracking_url = validation::optional(self.tracking_url.as_deref());
        let tracking = (carrier.is_some() || tracking_number.is_some() || tracking_url.is_some())
            .then_some(Tracking {
                carrier,
                tracking_number,
                tracking_url,
                estimated_delivery: None,
            });

        UpdateOrderStatus {
            status: self.status,
            tracking,
        }
    }
}

/// Order status change handler.
#[instrument(skip(admin, state, session, form), fields(status = form.status.as_str()))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let update = form.into_update();

    match state.api().update_order_status(admin.token(), id, &update).await {
        Ok(order) => {
            tracing::info!(order_id = %id, status = order.status.as_str(), "Order status updated");
            Flash::success(format!("Order {} is now {}.", order.order_number, order.status.label()))
                .push(&session)
                .await;
        }
        Err(e) if !e.is_server_error() && !matches!(e, crate::api::ApiError::Unauthorized(_)) => {
            Flash::error(e.summary()).push(&session).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&format!("/orders/{id}")))
}
