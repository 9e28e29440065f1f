//! Authentication route handlers.
//!
//! Customers sign in against the backend API; the returned bearer token is
//! kept in the session alongside the user record.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use threadline_core::{LoginRequest, validation};
use tower_sessions::Session;
use tracing::instrument;

use super::layout::Layout;
use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalCustomer, clear_current_customer, set_current_customer};
use crate::models::{CustomerSession, Flash};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

/// Only same-site paths are allowed as post-login targets.
#[must_use]
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Login path that returns to `next` afterwards.
#[must_use]
pub fn login_path(next: &str) -> String {
    format!(
        "/auth/login?{}",
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("next", next)
            .finish()
    )
}

/// Drop a customer whose token the backend no longer accepts and send them
/// back through login.
pub(crate) async fn reauthenticate(session: &Session, next: &str) -> Response {
    if let Err(e) = clear_current_customer(session).await {
        tracing::error!("Failed to clear expired customer session: {e}");
    }
    clear_sentry_user();
    Flash::error("Your session has expired. Please sign in again.")
        .push(session)
        .await;
    Redirect::to(&login_path(next)).into_response()
}

/// Display login page.
#[instrument(skip(session, customer))]
pub async fn login_page(
    session: Session,
    OptionalCustomer(customer): OptionalCustomer,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if customer.is_some() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        layout: Layout::load(&session, None).await,
        email: String::new(),
        next,
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref());

    let credentials = validation::required("email", &form.email)
        .and_then(|email| validation::required("password", &form.password).map(|_| email));
    let email = match credentials {
        Ok(email) => email,
        Err(e) => {
            return Ok(login_failed(&session, form.email, next, e.to_string()).await);
        }
    };

    let request = LoginRequest {
        email: &email,
        password: &form.password,
    };

    match state.api().login(&request).await {
        Ok(auth) => {
            let customer = CustomerSession::new(auth);
            set_current_customer(&session, &customer).await?;
            set_sentry_user(&customer.user.id, Some(&customer.user.email));
            tracing::info!(user_id = %customer.user.id, "Customer signed in");
            Flash::success(format!("Welcome back, {}.", customer.user.display_name()))
                .push(&session)
                .await;
            Ok(Redirect::to(&next).into_response())
        }
        Err(ApiError::Unauthorized(_) | ApiError::Envelope(_)) => Ok(login_failed(
            &session,
            email,
            next,
            "Invalid email or password.".to_string(),
        )
        .await),
        Err(e) => {
            tracing::error!("Login request failed: {e}");
            Ok(login_failed(&session, email, next, e.user_message()).await)
        }
    }
}

async fn login_failed(session: &Session, email: String, next: String, error: String) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        LoginTemplate {
            layout: Layout::load(session, None).await,
            email,
            next,
            error: Some(error),
        },
    )
        .into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Flash::success("You have been signed out.").push(&session).await;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("/checkout")), "/checkout");
        assert_eq!(safe_next(Some("//evil.test")), "/");
        assert_eq!(safe_next(Some("https://evil.test")), "/");
        assert_eq!(safe_next(Some("/\\evil.test")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_login_path_encodes_next() {
        assert_eq!(
            login_path("/account/orders/7"),
            "/auth/login?next=%2Faccount%2Forders%2F7"
        );
    }
}
