//! Product route handlers.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use threadline_core::variants::VariantSelector;
use threadline_core::{
    Category, ColorId, ColorOption, Paginated, Product, ProductSummary, SizeId, SizeOption,
};
use tower_sessions::Session;
use tracing::instrument;

use super::empty_string_as_none;
use super::layout::Layout;
use crate::api::{ApiError, ProductQuery, SortOrder};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalCustomer;
use crate::services::listing::{self, Fresh};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<String>,
}

impl From<&ProductSummary> for ProductCardView {
    fn from(product: &ProductSummary) -> Self {
        let price = product.price_point();
        Self {
            id: product.id.as_i64(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            price: price.current.to_string(),
            compare_at_price: price.compare_at.map(|p| p.to_string()),
            image: product.thumbnail.clone(),
        }
    }
}

/// A filter option in the listing sidebar.
#[derive(Clone)]
pub struct FilterOptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Listing grid display data (shared by page and fragment).
#[derive(Clone)]
pub struct GridView {
    pub products: Vec<ProductCardView>,
    pub error: Option<String>,
    pub page: u32,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

/// Selectable option on the product page.
#[derive(Clone)]
pub struct OptionView {
    pub label: String,
    pub swatch: Option<String>,
    pub link: String,
    pub selected: bool,
    pub available: bool,
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductPageView {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub images: Vec<ImageView>,
    pub colors: Vec<OptionView>,
    pub sizes: Vec<OptionView>,
    /// Resolved variant id; `None` when the selected pair is unavailable.
    pub variant_id: Option<i64>,
    pub variant_quantity: i64,
    pub sold_out: bool,
}

// =============================================================================
// Query Types
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub color: Option<ColorId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<SizeId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sale: Option<bool>,
}

impl From<&ListingParams> for ProductQuery {
    fn from(params: &ListingParams) -> Self {
        Self {
            page: params.page.unwrap_or(1).max(1),
            category: params.category.clone(),
            color: params.color,
            size: params.size,
            sort: params
                .sort
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            search: params.search.clone(),
            on_sale: params.sale.unwrap_or(false),
            ..Self::default()
        }
    }
}

/// The axis a shopper just changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangedAxis {
    Color,
    Size,
}

impl FromStr for ChangedAxis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "color" => Ok(Self::Color),
            "size" => Ok(Self::Size),
            other => Err(format!("unknown axis '{other}'")),
        }
    }
}

/// Product page selection carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub color: Option<ColorId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<SizeId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub changed: Option<ChangedAxis>,
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub grid: GridView,
    pub categories: Vec<FilterOptionView>,
    pub colors: Vec<FilterOptionView>,
    pub sizes: Vec<FilterOptionView>,
    pub sorts: Vec<FilterOptionView>,
    pub search: String,
}

/// Listing grid fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub grid: GridView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductPageView,
    pub signed_in: bool,
}

// =============================================================================
// Listing
// =============================================================================

fn grid_view(
    query: &ProductQuery,
    result: std::result::Result<Paginated<ProductSummary>, ApiError>,
) -> GridView {
    match result {
        Ok(page) => {
            let link = |n: u32| format!("/products?{}", query.with_page(n).to_query_string());
            GridView {
                products: page.items.iter().map(ProductCardView::from).collect(),
                error: None,
                page: page.pagination.page,
                prev_link: page.pagination.prev_page().map(link),
                next_link: page.pagination.next_page().map(link),
            }
        }
        Err(e) => {
            tracing::error!("Failed to fetch product listing: {e}");
            GridView {
                products: Vec::new(),
                error: Some(e.user_message()),
                page: query.page,
                prev_link: None,
                next_link: None,
            }
        }
    }
}

fn category_options(categories: &[Category], selected: Option<&str>) -> Vec<FilterOptionView> {
    categories
        .iter()
        .map(|c| FilterOptionView {
            value: c.slug.clone(),
            label: c.name.clone(),
            selected: selected == Some(c.slug.as_str()),
        })
        .collect()
}

fn color_options(colors: &[ColorOption], selected: Option<ColorId>) -> Vec<FilterOptionView> {
    threadline_core::variants::display_sorted(colors, |c| c.display_order)
        .into_iter()
        .map(|c| FilterOptionView {
            value: c.id.to_string(),
            label: c.name.clone(),
            selected: selected == Some(c.id),
        })
        .collect()
}

fn size_options(sizes: &[SizeOption], selected: Option<SizeId>) -> Vec<FilterOptionView> {
    threadline_core::variants::display_sorted(sizes, |s| s.display_order)
        .into_iter()
        .map(|s| FilterOptionView {
            value: s.id.to_string(),
            label: s.name.clone(),
            selected: selected == Some(s.id),
        })
        .collect()
}

fn sort_options(selected: SortOrder) -> Vec<FilterOptionView> {
    SortOrder::ALL
        .into_iter()
        .map(|s| FilterOptionView {
            value: s.as_str().to_string(),
            label: s.label().to_string(),
            selected: s == selected,
        })
        .collect()
}

/// Display product listing page.
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    Query(params): Query<ListingParams>,
) -> impl IntoResponse {
    let query = ProductQuery::from(&params);
    let api = state.api();

    let (products, categories, colors, sizes) =
        tokio::join!(api.products(&query), api.categories(), api.colors(), api.sizes());

    ProductsIndexTemplate {
        layout: Layout::load(&session, customer.as_ref()).await,
        grid: grid_view(&query, products),
        categories: category_options(&categories.unwrap_or_default(), query.category.as_deref()),
        colors: color_options(&colors.unwrap_or_default(), query.color),
        sizes: size_options(&sizes.unwrap_or_default(), query.size),
        sorts: sort_options(query.sort),
        search: query.search.clone().unwrap_or_default(),
    }
}

/// Listing grid fragment (HTMX).
///
/// Responds `204 No Content` when a newer filter request from the same
/// viewer was issued while this one was in flight, so htmx keeps the newer
/// results on screen.
#[instrument(skip(state, session))]
pub async fn fragment(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListingParams>,
) -> Result<Response> {
    let query = ProductQuery::from(&params);
    let viewer = listing::viewer_id(&session).await?;
    let generations = state.generations().for_viewer(viewer).await;

    match listing::guarded(&generations, state.api().products(&query)).await {
        Fresh::Current(result) => Ok(ProductGridTemplate {
            grid: grid_view(&query, result),
        }
        .into_response()),
        Fresh::Superseded => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// =============================================================================
// Detail
// =============================================================================

/// Rebuild the shopper's selection from the query string and replay the
/// change they just made.
#[must_use]
pub fn replay_selection<'a>(
    product: &'a Product,
    params: &SelectionParams,
) -> VariantSelector<'a> {
    if params.color.is_none() && params.size.is_none() {
        return VariantSelector::new(product);
    }

    let mut selector = VariantSelector::restore(product, params.color, params.size);
    match (params.changed, params.color, params.size) {
        (Some(ChangedAxis::Color), Some(color), _) => selector.select_color(color),
        (Some(ChangedAxis::Size), _, Some(size)) => selector.select_size(size),
        // Deep link to an unavailable pair: reconcile around the given color.
        (_, Some(color), _) if selector.variant().is_none() => selector.select_color(color),
        (_, None, Some(size)) if selector.variant().is_none() => selector.select_size(size),
        _ => {}
    }
    selector
}

fn selection_link(
    slug: &str,
    color: Option<ColorId>,
    size: Option<SizeId>,
    changed: ChangedAxis,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(color) = color {
        query.append_pair("color", &color.to_string());
    }
    if let Some(size) = size {
        query.append_pair("size", &size.to_string());
    }
    query.append_pair(
        "changed",
        match changed {
            ChangedAxis::Color => "color",
            ChangedAxis::Size => "size",
        },
    );
    format!("/products/{slug}?{}", query.finish())
}

impl ProductPageView {
    /// Build the page view from a reconciled selection.
    #[must_use]
    pub fn new(selector: &VariantSelector<'_>) -> Self {
        let product = selector.product();
        let selection = selector.selection();
        let variant = selector.variant();

        let price = variant.map_or_else(|| product.price_point(), |v| v.price_point());

        let colors = selector
            .color_choices()
            .into_iter()
            .map(|choice| OptionView {
                label: choice.option.name.clone(),
                swatch: choice.option.hex_code.clone(),
                link: selection_link(
                    &product.slug,
                    Some(choice.option.id),
                    selection.size_id(),
                    ChangedAxis::Color,
                ),
                selected: choice.selected,
                available: choice.available,
            })
            .collect();

        let sizes = selector
            .size_choices()
            .into_iter()
            .map(|choice| OptionView {
                label: choice.option.name.clone(),
                swatch: None,
                link: selection_link(
                    &product.slug,
                    selection.color_id(),
                    Some(choice.option.id),
                    ChangedAxis::Size,
                ),
                selected: choice.selected,
                available: choice.available,
            })
            .collect();

        // Selected variant's gallery; otherwise the product cover.
        let images = variant
            .filter(|v| !v.images.is_empty())
            .map(|v| v.images.iter().collect::<Vec<_>>())
            .or_else(|| product.cover_image().map(|img| vec![img]))
            .unwrap_or_default()
            .into_iter()
            .map(|img| ImageView {
                url: img.url.clone(),
                alt: img.alt_text.clone().unwrap_or_else(|| product.name.clone()),
            })
            .collect();

        Self {
            id: product.id.as_i64(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: price.current.to_string(),
            compare_at_price: price.compare_at.map(|p| p.to_string()),
            images,
            colors,
            sizes,
            variant_id: variant.map(|v| v.id.as_i64()),
            variant_quantity: variant.map_or(0, |v| v.quantity),
            sold_out: selector.is_sold_out(),
        }
    }
}

/// Display product detail page.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    Path(slug): Path<String>,
    Query(params): Query<SelectionParams>,
) -> Result<ProductShowTemplate> {
    let product = state.api().product(&slug).await?;
    if !product.is_active {
        return Err(AppError::NotFound(format!("product {slug}")));
    }

    let selector = replay_selection(&product, &params);
    let view = ProductPageView::new(&selector);

    Ok(ProductShowTemplate {
        layout: Layout::load(&session, customer.as_ref()).await,
        product: view,
        signed_in: customer.is_some(),
    })
}
