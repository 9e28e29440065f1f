//! Admin sign-in.

use threadline_core::{AuthSession, LoginRequest};
use tracing::instrument;

use super::{ApiClient, ApiError};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// The caller checks the returned role; the backend issues tokens to
    /// customers through the same endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        self.fetch(self.inner.client.post(url).json(request)).await
    }
}
