//! Authentication route handlers.
//!
//! Admins sign in with the same backend endpoint as customers; only accounts
//! with the admin role get a session.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use threadline_core::{LoginRequest, UserRole, validation};
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use super::render;
use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

/// Display login page. Signed-in admins go straight to the dashboard.
#[instrument(skip(session, admin))]
pub async fn login_page(session: Session, OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some_and(|admin| admin.user.role == UserRole::Admin) {
        return Redirect::to("/").into_response();
    }
    render(&LoginTemplate {
        layout: Layout::load(&session, None, "/auth/login").await,
        email: String::new(),
        error: None,
    })
    .into_response()
}

async fn login_failed(session: &Session, status: StatusCode, email: String, error: &str) -> Response {
    let page = LoginTemplate {
        layout: Layout::load(session, None, "/auth/login").await,
        email,
        error: Some(error.to_string()),
    };
    (status, render(&page)).into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let credentials = validation::required("email", &form.email)
        .and_then(|email| validation::required("password", &form.password).map(|_| email));
    let email = match credentials {
        Ok(email) => email,
        Err(e) => {
            return Ok(login_failed(
                &session,
                StatusCode::UNPROCESSABLE_ENTITY,
                form.email,
                &e.to_string(),
            )
            .await);
        }
    };

    let request = LoginRequest {
        email: &email,
        password: &form.password,
    };

    let auth = match state.api().login(&request).await {
        Ok(auth) => auth,
        Err(ApiError::Unauthorized(_) | ApiError::Envelope(_)) => {
            return Ok(login_failed(
                &session,
                StatusCode::UNPROCESSABLE_ENTITY,
                email,
                "Invalid email or password.",
            )
            .await);
        }
        Err(e) => return Err(e.into()),
    };

    if auth.user.role != UserRole::Admin {
        tracing::warn!(user_id = %auth.user.id, "Non-admin account attempted admin login");
        return Ok(login_failed(
            &session,
            StatusCode::FORBIDDEN,
            email,
            "This account does not have admin access.",
        )
        .await);
    }

    let admin = CurrentAdmin::new(auth);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.user.id, Some(&admin.user.email));
    tracing::info!(user_id = %admin.user.id, "Admin signed in");

    Ok(Redirect::to("/").into_response())
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Flash::success("Signed out.").push(&session).await;
    Ok(Redirect::to("/auth/login"))
}
