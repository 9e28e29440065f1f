//! Authentication and wishlist endpoints.

use secrecy::SecretString;
use serde::Serialize;
use threadline_core::{AuthSession, LoginRequest, ProductId, ProductSummary, resolve_image_url};
use tracing::instrument;

use super::{ApiClient, ApiError};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WishlistItem {
    product_id: ProductId,
}

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        self.fetch(self.request(reqwest::Method::POST, url, None).json(request))
            .await
    }

    /// Products on the customer's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn wishlist(&self, token: &SecretString) -> Result<Vec<ProductSummary>, ApiError> {
        let url = self.endpoint(&["users", "wishlist"])?;
        let mut items: Vec<ProductSummary> = self
            .fetch(self.request(reqwest::Method::GET, url, Some(token)))
            .await?;
        for item in &mut items {
            item.thumbnail = item
                .thumbnail
                .as_deref()
                .map(|reference| resolve_image_url(self.storage_base_url(), reference));
        }
        Ok(items)
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_wishlist(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["users", "wishlist"])?;
        self.acknowledge(
            self.request(reqwest::Method::POST, url, Some(token))
                .json(&WishlistItem { product_id }),
        )
        .await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_from_wishlist(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["users", "wishlist", &product_id.to_string()])?;
        self.acknowledge(self.request(reqwest::Method::DELETE, url, Some(token)))
            .await
    }
}
