//! Category, color and size list handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use super::render;
use crate::api::{ApiError, NewTaxonomyEntry, TaxonomyEntry, TaxonomyKind};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::state::AppState;

fn parse_kind(raw: &str) -> Result<TaxonomyKind> {
    raw.parse().map_err(AppError::NotFound)
}

/// Catalog list template.
#[derive(Template)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    pub layout: Layout,
    pub kind: TaxonomyKind,
    pub entries: Vec<TaxonomyEntry>,
    pub error: Option<String>,
}

/// List handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(kind): Path<String>,
) -> Result<Html<String>> {
    let kind = parse_kind(&kind)?;

    let (entries, error) = match state.api().taxonomy(admin.token(), kind).await {
        Ok(entries) => (entries, None),
        Err(e @ ApiError::Unauthorized(_)) => return Err(e.into()),
        Err(e) => {
            tracing::error!(kind = kind.as_str(), "Failed to fetch catalog list: {e}");
            (Vec::new(), Some(e.summary()))
        }
    };

    Ok(render(&CatalogTemplate {
        layout: Layout::load(&session, Some(&admin), "/catalog").await,
        kind,
        entries,
        error,
    }))
}

/// New entry form data.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub display_order: Option<String>,
    #[serde(default)]
    pub hex_code: Option<String>,
}

/// Create handler.
#[instrument(skip(admin, state, session, form), fields(name = %form.name))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(kind): Path<String>,
    Form(form): Form<EntryForm>,
) -> Result<Redirect> {
    let kind = parse_kind(&kind)?;
    let back = format!("/catalog/{kind}");

    let entry = match NewTaxonomyEntry::parse(
        kind,
        &form.name,
        form.slug.as_deref(),
        form.display_order.as_deref(),
        form.hex_code.as_deref(),
    ) {
        Ok(entry) => entry,
        Err(e) => {
            Flash::error(e.to_string()).push(&session).await;
            return Ok(Redirect::to(&back));
        }
    };

    match state.api().create_taxonomy(admin.token(), kind, &entry).await {
        Ok(_) => {
            tracing::info!(kind = kind.as_str(), "Catalog entry created");
            Flash::success(format!("Added {}.", entry.name)).push(&session).await;
        }
        Err(e @ ApiError::Unauthorized(_)) => return Err(e.into()),
        Err(e) => Flash::error(e.summary()).push(&session).await,
    }

    Ok(Redirect::to(&back))
}

/// Delete handler.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Redirect> {
    let kind = parse_kind(&kind)?;

    match state.api().delete_taxonomy(admin.token(), kind, id).await {
        Ok(_) => Flash::success("Deleted.").push(&session).await,
        Err(e @ ApiError::Unauthorized(_)) => return Err(e.into()),
        Err(e) => Flash::error(e.summary()).push(&session).await,
    }

    Ok(Redirect::to(&format!("/catalog/{kind}")))
}
