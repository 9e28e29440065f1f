//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use super::products::ProductCardView;
use crate::filters;
use crate::middleware::OptionalCustomer;
use crate::services::home::{self, HomeRow};
use crate::state::AppState;

/// Home row display data for templates.
#[derive(Clone)]
pub struct RowView {
    pub title: String,
    pub link: String,
    pub products: Vec<ProductCardView>,
    pub failed: bool,
}

impl From<&HomeRow> for RowView {
    fn from(row: &HomeRow) -> Self {
        Self {
            title: row.title.clone(),
            link: row.link.clone(),
            products: row.products.iter().map(ProductCardView::from).collect(),
            failed: row.failed,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub rows: Vec<RowView>,
}

/// Display home page.
#[instrument(skip(state, session, customer))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
) -> HomeTemplate {
    let rows = home::load_rows(state.api()).await;

    HomeTemplate {
        layout: Layout::load(&session, customer.as_ref()).await,
        rows: rows.iter().map(RowView::from).collect(),
    }
}
