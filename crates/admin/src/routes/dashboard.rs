//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use super::orders::OrderRowView;
use super::render;
use crate::api::{OrderListQuery, ProductListQuery};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Orders shown on the dashboard.
const RECENT_ORDERS: usize = 5;

/// Dashboard metrics.
#[derive(Debug, Clone, Default)]
pub struct DashboardMetrics {
    pub orders: String,
    pub open_orders: usize,
    pub products: String,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<OrderRowView>,
}

/// Dashboard page handler.
#[instrument(skip(admin, state, session))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let token = admin.token();
    let product_query = ProductListQuery::default();
    let (orders_result, products_result) = tokio::join!(
        state.api().orders(token, OrderListQuery::default()),
        state.api().products(token, &product_query),
    );

    let (order_count, open_orders, recent_orders) = match orders_result {
        Ok(page) => (
            page.pagination.total.max(page.items.len() as u64).to_string(),
            page.items.iter().filter(|o| o.status.is_cancellable()).count(),
            page.items
                .iter()
                .take(RECENT_ORDERS)
                .map(OrderRowView::from)
                .collect(),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch orders: {e}");
            ("-".to_string(), 0, Vec::new())
        }
    };

    let product_count = match products_result {
        Ok(page) => page.pagination.total.max(page.items.len() as u64).to_string(),
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            "-".to_string()
        }
    };

    render(&DashboardTemplate {
        layout: Layout::load(&session, Some(&admin), "/").await,
        metrics: DashboardMetrics {
            orders: order_count,
            open_orders,
            products: product_count,
        },
        recent_orders,
    })
}
