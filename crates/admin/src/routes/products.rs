//! Product management route handlers.
//!
//! The edit page works on a session-held draft of the product aggregate.
//! Image operations change the draft first and then sync; a failed sync
//! leaves the change in the draft and flashes a warning. Saving the form
//! replaces the whole aggregate on the backend.

use askama::Template;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use threadline_core::ordering;
use threadline_core::{
    Pagination, Product, ProductFields, ProductId, ProductInput, ProductSummary, Variant,
    VariantId,
};
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use super::{empty_string_as_none, is_htmx, render};
use crate::api::{ApiClient, ApiError, ImageUpload, ProductListQuery, TaxonomyKind};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Flash, ProductDraft};
use crate::services::variant_images::{self, ImageCommand, SyncOutcome};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Product row for the list page.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub is_active: bool,
    pub thumbnail: Option<String>,
}

impl From<&ProductSummary> for ProductRowView {
    fn from(product: &ProductSummary) -> Self {
        let price = product.price_point();
        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: price.current.to_string(),
            compare_at_price: price.compare_at.map(|p| p.to_string()),
            is_active: product.is_active,
            thumbnail: product.thumbnail.clone(),
        }
    }
}

/// Product form values, as entered or as loaded.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: String,
    pub sale_price: String,
    pub category_id: String,
    pub is_active: bool,
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            sale_price: product.sale_price.map(|p| p.to_string()).unwrap_or_default(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            is_active: product.is_active,
        }
    }
}

impl From<&ProductForm> for ProductFormView {
    fn from(form: &ProductForm) -> Self {
        Self {
            name: form.name.clone(),
            slug: form.slug.clone(),
            description: form.description.clone(),
            price: form.price.clone(),
            sale_price: form.sale_price.clone().unwrap_or_default(),
            category_id: form.category_id.clone().unwrap_or_default(),
            is_active: form.is_active.is_some(),
        }
    }
}

/// Category choice for the form's select.
#[derive(Debug, Clone)]
pub struct CategoryOptionView {
    pub id: String,
    pub name: String,
}

/// One image in the variant image editor.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub index: usize,
    pub url: String,
    pub is_primary: bool,
    pub pending: bool,
    pub is_first: bool,
    pub is_last: bool,
}

/// A variant with its image editor.
#[derive(Debug, Clone)]
pub struct VariantView {
    pub product_id: i64,
    pub id: i64,
    pub label: String,
    pub sku: String,
    pub price: String,
    pub quantity: i64,
    pub is_active: bool,
    pub images: Vec<ImageView>,
}

impl VariantView {
    fn new(product: &Product, variant: &Variant) -> Self {
        let count = variant.images.len();
        Self {
            product_id: product.id.as_i64(),
            id: variant.id.as_i64(),
            label: product
                .variant_label(variant)
                .unwrap_or_else(|| "Default".to_string()),
            sku: variant.sku.clone().unwrap_or_default(),
            price: variant.price_point().current.to_string(),
            quantity: variant.quantity,
            is_active: variant.is_active,
            images: variant
                .images
                .iter()
                .enumerate()
                .map(|(index, image)| ImageView {
                    index,
                    url: image.url.clone(),
                    is_primary: image.is_primary,
                    pending: image.id.persisted().is_none(),
                    is_first: index == 0,
                    is_last: index + 1 == count,
                })
                .collect(),
        }
    }
}

fn variant_views(product: &Product) -> Vec<VariantView> {
    product
        .variants
        .iter()
        .map(|variant| VariantView::new(product, variant))
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Products list template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRowView>,
    pub search: String,
    pub pagination: Pagination,
    pub error: Option<String>,
}

/// Product create/edit template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub product_id: Option<i64>,
    pub form: ProductFormView,
    pub categories: Vec<CategoryOptionView>,
    pub variants: Vec<VariantView>,
    pub pending_images: usize,
    pub error: Option<String>,
}

/// Variant image editor fragment (for HTMX).
#[derive(Template)]
#[template(path = "partials/variant_images.html")]
pub struct VariantImagesTemplate {
    pub variant: VariantView,
}

// =============================================================================
// Forms
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductIndexParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
}

/// Product form data.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub sale_price: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Checkbox; present when checked.
    #[serde(default)]
    pub is_active: Option<String>,
}

impl ProductForm {
    fn fields(&self) -> ProductFields<'_> {
        ProductFields {
            name: &self.name,
            slug: &self.slug,
            description: &self.description,
            price: &self.price,
            sale_price: self.sale_price.as_deref(),
            category_id: self.category_id.as_deref(),
            is_active: self.is_active.is_some(),
        }
    }
}

/// Edit page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct EditParams {
    /// Discard the session draft and load the product fresh.
    #[serde(default)]
    pub reload: Option<String>,
}

/// Reorder form data.
#[derive(Debug, Deserialize)]
pub struct ReorderForm {
    pub from: usize,
    pub to: usize,
}

// =============================================================================
// Helpers
// =============================================================================

async fn category_options(api: &ApiClient, token: &SecretString) -> Vec<CategoryOptionView> {
    match api.taxonomy(token, TaxonomyKind::Categories).await {
        Ok(entries) => entries
            .into_iter()
            .map(|entry| CategoryOptionView {
                id: entry.id.to_string(),
                name: entry.name,
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to load categories for product form: {e}");
            Vec::new()
        }
    }
}

/// Load the draft for `id`, fetching the product if none is open.
async fn load_draft(
    api: &ApiClient,
    admin: &CurrentAdmin,
    session: &Session,
    id: ProductId,
) -> Result<ProductDraft> {
    if let Some(draft) = ProductDraft::load(session, id).await? {
        return Ok(draft);
    }
    let product = api.product(admin.token(), id).await?;
    let draft = ProductDraft::new(product);
    draft.save(session).await?;
    Ok(draft)
}

/// Drop images that never reached the backend and renumber the rest.
fn persisted_images_only(input: &mut ProductInput) {
    for variant in &mut input.variants {
        variant.images.retain(|image| image.id.persisted().is_some());
        ordering::normalize(&mut variant.images);
    }
}

fn edit_path(id: ProductId) -> String {
    format!("/products/{id}")
}

async fn form_page(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    product: Option<&Product>,
    form: ProductFormView,
    error: Option<String>,
) -> ProductFormTemplate {
    let current_path = if product.is_some() {
        "/products/edit"
    } else {
        "/products/new"
    };
    let variants = product.map(variant_views).unwrap_or_default();
    let pending_images = variants
        .iter()
        .flat_map(|v| &v.images)
        .filter(|image| image.pending)
        .count();

    ProductFormTemplate {
        layout: Layout::load(session, Some(admin), current_path).await,
        product_id: product.map(|p| p.id.as_i64()),
        form,
        categories: category_options(state.api(), admin.token()).await,
        variants,
        pending_images,
        error,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Product list handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ProductIndexParams>,
) -> Result<Html<String>> {
    let query = ProductListQuery {
        page: params.page.unwrap_or(1),
        search: params.search.clone(),
    };

    let (products, pagination, error) = match state.api().products(admin.token(), &query).await {
        Ok(page) => (
            page.items.iter().map(ProductRowView::from).collect(),
            page.pagination,
            None,
        ),
        Err(e @ ApiError::Unauthorized(_)) => return Err(e.into()),
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            (Vec::new(), Pagination::default(), Some(e.summary()))
        }
    };

    Ok(render(&ProductsIndexTemplate {
        layout: Layout::load(&session, Some(&admin), "/products").await,
        products,
        search: params.search.unwrap_or_default(),
        pagination,
        error,
    }))
}

/// New product form handler.
#[instrument(skip(admin, state, session))]
pub async fn new(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let form = ProductFormView {
        is_active: true,
        ..ProductFormView::default()
    };
    render(&form_page(&state, &session, &admin, None, form, None).await)
}

/// Create product handler.
#[instrument(skip(admin, state, session, form), fields(slug = %form.slug))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match ProductInput::parse(form.fields()) {
        Ok(input) => input,
        Err(e) => {
            let page = form_page(&state, &session, &admin, None, (&form).into(), Some(e.to_string())).await;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)).into_response());
        }
    };

    match state.api().create_product(admin.token(), &input).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            let path = edit_path(product.id);
            ProductDraft::new(product).save(&session).await?;
            Flash::success("Product created.").push(&session).await;
            Ok(Redirect::to(&path).into_response())
        }
        Err(e) if !e.is_server_error() && !matches!(e, ApiError::Unauthorized(_)) => {
            let page = form_page(&state, &session, &admin, None, (&form).into(), Some(e.summary())).await;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Edit product handler.
#[instrument(skip(admin, state, session))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Query(params): Query<EditParams>,
) -> Result<Html<String>> {
    if params.reload.is_some() {
        ProductDraft::clear(&session).await?;
    }
    let draft = load_draft(state.api(), &admin, &session, id).await?;
    let form = ProductFormView::from(&draft.product);
    Ok(render(
        &form_page(&state, &session, &admin, Some(&draft.product), form, None).await,
    ))
}

/// Save product handler. Sends the whole aggregate, including variants and
/// their images, from the draft.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let draft = load_draft(state.api(), &admin, &session, id).await?;

    let mut input = match ProductInput::parse(form.fields()) {
        Ok(input) => input.with_aggregate(&draft.product),
        Err(e) => {
            let page = form_page(
                &state,
                &session,
                &admin,
                Some(&draft.product),
                (&form).into(),
                Some(e.to_string()),
            )
            .await;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)).into_response());
        }
    };
    persisted_images_only(&mut input);

    match state.api().update_product(admin.token(), id, &input).await {
        Ok(product) => {
            tracing::info!(product_id = %id, "Product saved");
            ProductDraft::new(product).save(&session).await?;
            Flash::success("Product saved.").push(&session).await;
            Ok(Redirect::to(&edit_path(id)).into_response())
        }
        Err(e) if !e.is_server_error() && !matches!(e, ApiError::Unauthorized(_)) => {
            let page = form_page(
                &state,
                &session,
                &admin,
                Some(&draft.product),
                (&form).into(),
                Some(e.summary()),
            )
            .await;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete product handler.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    match state.api().delete_product(admin.token(), id).await {
        Ok(_) => {
            tracing::info!(product_id = %id, "Product deleted");
            if ProductDraft::load(&session, id).await?.is_some() {
                ProductDraft::clear(&session).await?;
            }
            Flash::success("Product deleted.").push(&session).await;
            Ok(Redirect::to("/products"))
        }
        Err(e) if !e.is_server_error() && !matches!(e, ApiError::Unauthorized(_)) => {
            Flash::error(e.summary()).push(&session).await;
            Ok(Redirect::to(&edit_path(id)))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Variant images
// =============================================================================

/// Save the draft, flash the outcome and answer with the editor fragment
/// (htmx) or a redirect back to the edit page.
async fn finish_image_change(
    session: &Session,
    headers: &HeaderMap,
    draft: &ProductDraft,
    variant_id: VariantId,
    outcome: &SyncOutcome,
    done: &str,
) -> Result<Response> {
    draft.save(session).await?;

    let flash = match outcome {
        SyncOutcome::Synced | SyncOutcome::LocalOnly => Flash::success(done),
        SyncOutcome::Failed(e) => Flash::warning(format!(
            "Change kept in this editor but not saved: {}",
            e.summary()
        )),
    };

    let product = &draft.product;
    if is_htmx(headers)
        && let Some(variant) = product.variant(variant_id)
    {
        if outcome.is_failed() {
            flash.push(session).await;
        }
        let fragment = VariantImagesTemplate {
            variant: VariantView::new(product, variant),
        };
        return Ok(render(&fragment).into_response());
    }

    flash.push(session).await;
    Ok(Redirect::to(&format!("{}#variant-{variant_id}", edit_path(product.id))).into_response())
}

async fn run_image_command(
    state: &AppState,
    admin: &CurrentAdmin,
    session: &Session,
    headers: &HeaderMap,
    (id, variant_id): (ProductId, VariantId),
    command: ImageCommand,
    done: &str,
) -> Result<Response> {
    let mut draft = load_draft(state.api(), admin, session, id).await?;
    let outcome = variant_images::apply(
        state.api(),
        admin.token(),
        &mut draft.product,
        variant_id,
        command,
    )
    .await?;
    finish_image_change(session, headers, &draft, variant_id, &outcome, done).await
}

/// Upload image handler (multipart field `image`).
#[instrument(skip(admin, state, session, headers, multipart))]
pub async fn upload_image(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((id, variant_id)): Path<(ProductId, VariantId)>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let back = format!("{}#variant-{variant_id}", edit_path(id));
    let upload = match upload {
        Some(upload) if !upload.bytes.is_empty() && upload.content_type.starts_with("image/") => {
            upload
        }
        Some(_) => {
            Flash::error("Only image files can be uploaded.").push(&session).await;
            return Ok(Redirect::to(&back).into_response());
        }
        None => {
            Flash::error("Choose an image to upload.").push(&session).await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    let mut draft = load_draft(state.api(), &admin, &session, id).await?;
    let outcome = variant_images::upload(
        state.api(),
        admin.token(),
        &mut draft.product,
        variant_id,
        upload,
    )
    .await?;
    finish_image_change(&session, &headers, &draft, variant_id, &outcome, "Image uploaded.").await
}

/// Set primary image handler.
#[instrument(skip(admin, state, session, headers))]
pub async fn set_primary_image(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((id, variant_id, index)): Path<(ProductId, VariantId, usize)>,
    headers: HeaderMap,
) -> Result<Response> {
    run_image_command(
        &state,
        &admin,
        &session,
        &headers,
        (id, variant_id),
        ImageCommand::SetPrimary(index),
        "Primary image updated.",
    )
    .await
}

/// Remove image handler.
#[instrument(skip(admin, state, session, headers))]
pub async fn delete_image(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((id, variant_id, index)): Path<(ProductId, VariantId, usize)>,
    headers: HeaderMap,
) -> Result<Response> {
    run_image_command(
        &state,
        &admin,
        &session,
        &headers,
        (id, variant_id),
        ImageCommand::Remove(index),
        "Image removed.",
    )
    .await
}

/// Reorder image handler.
#[instrument(skip(admin, state, session, headers, form))]
pub async fn reorder_image(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((id, variant_id)): Path<(ProductId, VariantId)>,
    headers: HeaderMap,
    Form(form): Form<ReorderForm>,
) -> Result<Response> {
    run_image_command(
        &state,
        &admin,
        &session,
        &headers,
        (id, variant_id),
        ImageCommand::Reorder {
            from: form.from,
            to: form.to,
        },
        "Image order saved.",
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use threadline_core::{ImageKey, VariantImage};

    use super::*;

    fn product() -> Product {
        serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Linen Shirt",
            "slug": "linen-shirt",
            "price": "49.00",
            "salePrice": "39.00",
            "categoryId": 4,
            "colors": [{"id": 1, "name": "Red"}],
            "sizes": [{"id": 10, "name": "M"}],
            "variants": [{
                "id": 30, "productId": 3, "colorId": 1, "sizeId": 10, "price": "49.00",
                "quantity": 4,
                "images": [
                    {"id": 1, "url": "a.jpg", "order": 0, "isPrimary": true},
                    {"id": 2, "url": "b.jpg", "order": 1, "isPrimary": false}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_variant_view_marks_pending_and_edges() {
        let mut product = product();
        ordering::append(&mut product.variants[0].images, VariantImage::pending("c.jpg"));
        let view = VariantView::new(&product, &product.variants[0]);

        assert_eq!(view.label, "Red / M");
        assert_eq!(view.images.len(), 3);
        assert!(view.images[0].is_first && view.images[0].is_primary);
        assert!(view.images[2].is_last && view.images[2].pending);
        assert!(!view.images[1].pending);
    }

    #[test]
    fn test_form_view_from_product() {
        let view = ProductFormView::from(&product());
        assert_eq!(view.price, "49.00");
        assert_eq!(view.sale_price, "39.00");
        assert_eq!(view.category_id, "4");
        assert!(view.is_active);
    }

    #[test]
    fn test_save_drops_pending_images() {
        let mut product = product();
        let images = &mut product.variants[0].images;
        ordering::append(images, VariantImage::pending("c.jpg"));
        ordering::reorder(images, 2, 0).unwrap();

        let mut input = ProductInput::from(&product);
        persisted_images_only(&mut input);

        let images = &input.variants[0].images;
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, ImageKey::Persisted(threadline_core::ImageId::new(1)));
        assert!(ordering::is_normalized(images));
    }

    #[test]
    fn test_checkbox_maps_to_active_flag() {
        let form = ProductForm {
            name: "Tee".to_string(),
            slug: "tee".to_string(),
            description: String::new(),
            price: "10".to_string(),
            sale_price: None,
            category_id: None,
            is_active: None,
        };
        assert!(!form.fields().is_active);
        assert!(!ProductFormView::from(&form).is_active);
    }
}
