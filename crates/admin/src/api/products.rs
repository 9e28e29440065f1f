//! Admin product endpoints.

use secrecy::SecretString;
use serde::Deserialize;
use threadline_core::{Paginated, Product, ProductId, ProductInput, ProductSummary, prepare_images, resolve_image_url};
use tracing::instrument;

use super::{ApiClient, ApiError};

/// Products per admin list page.
pub const PAGE_SIZE: u32 = 25;

/// Filters for the admin product list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductListQuery {
    pub page: u32,
    pub search: Option<String>,
}

#[derive(Deserialize)]
struct ProductPayload {
    product: Product,
}

impl ApiClient {
    /// List products, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn products(
        &self,
        token: &SecretString,
        query: &ProductListQuery,
    ) -> Result<Paginated<ProductSummary>, ApiError> {
        let mut url = self.endpoint(&["admin", "products"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &query.page.max(1).to_string())
                .append_pair("limit", &PAGE_SIZE.to_string());
            if let Some(search) = &query.search {
                pairs.append_pair("search", search);
            }
        }

        let mut page: Paginated<ProductSummary> = self
            .fetch(self.request(reqwest::Method::GET, url, token))
            .await?;
        for summary in &mut page.items {
            summary.thumbnail = summary
                .thumbnail
                .as_deref()
                .map(|reference| resolve_image_url(self.storage_base_url(), reference));
        }
        Ok(page)
    }

    /// Get the full product aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn product(&self, token: &SecretString, id: ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&["admin", "products", &id.to_string()])?;
        let payload: ProductPayload = self
            .fetch(self.request(reqwest::Method::GET, url, token))
            .await?;
        Ok(self.prepared(payload.product))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the product or the request fails.
    #[instrument(skip(self, token, input), fields(slug = %input.slug))]
    pub async fn create_product(
        &self,
        token: &SecretString,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint(&["admin", "products"])?;
        let payload: ProductPayload = self
            .fetch(self.request(reqwest::Method::POST, url, token).json(input))
            .await?;
        Ok(self.prepared(payload.product))
    }

    /// Replace a product aggregate, including options, variants and images.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the product or the request fails.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint(&["admin", "products", &id.to_string()])?;
        let payload: ProductPayload = self
            .fetch(self.request(reqwest::Method::PUT, url, token).json(input))
            .await?;
        Ok(self.prepared(payload.product))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses or the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<Option<String>, ApiError> {
        let url = self.endpoint(&["admin", "products", &id.to_string()])?;
        self.acknowledge(self.request(reqwest::Method::DELETE, url, token))
            .await
    }

    fn prepared(&self, mut product: Product) -> Product {
        prepare_images(&mut product, self.storage_base_url());
        product
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;
    use threadline_core::ProductFields;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::tests::{client_for, token};
    use super::*;

    fn product_json() -> serde_json::Value {
        json!({
            "id": 3,
            "name": "Linen Shirt",
            "slug": "linen-shirt",
            "price": "49.00",
            "variants": [{
                "id": 30,
                "productId": 3,
                "price": "49.00",
                "quantity": 2,
                "images": [
                    {"id": 1, "url": "a.jpg", "order": 1, "isPrimary": false},
                    {"id": 2, "url": "b.jpg", "order": 0, "isPrimary": false}
                ]
            }]
        })
    }

    #[tokio::test]
    async fn test_product_normalizes_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/products/3"))
            .and(header("authorization", "Bearer admin-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"product": product_json()}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let product = client.product(&token(), ProductId::new(3)).await.unwrap();
        let images = &product.variants[0].images;
        assert_eq!(images[0].url, "https://bucket.local/b.jpg");
        assert!(images[0].is_primary);
        assert!(!images[1].is_primary);
    }

    #[tokio::test]
    async fn test_products_sends_search_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/products"))
            .and(query_param("search", "linen"))
            .and(query_param("limit", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"products": [], "pagination": {"page": 1, "limit": 25, "total": 0, "pages": 1}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let query = ProductListQuery {
            page: 1,
            search: Some("linen".to_string()),
        };
        assert!(client.products(&token(), &query).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_whole_aggregate() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/admin/products/3"))
            .and(body_partial_json(json!({"slug": "linen-shirt", "variants": [{"id": 30}]})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"product": product_json()}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let current: Product = serde_json::from_value(product_json()).unwrap();
        let input = ProductInput::parse(ProductFields {
            name: "Linen Shirt",
            slug: "linen-shirt",
            price: "49.00",
            is_active: true,
            ..ProductFields::default()
        })
        .unwrap()
        .with_aggregate(&current);

        client
            .update_product(&token(), ProductId::new(3), &input)
            .await
            .unwrap();
    }
}
