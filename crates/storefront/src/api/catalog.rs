//! Public catalog endpoints.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use threadline_core::{
    Category, ColorId, ColorOption, Paginated, Product, ProductSummary, SizeId, SizeOption,
    prepare_images, resolve_image_url,
};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError};

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Listing sort order understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    BestSelling,
    PriceAsc,
    PriceDesc,
    Name,
}

impl SortOrder {
    pub const ALL: [Self; 5] = [
        Self::Newest,
        Self::BestSelling,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Name,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::BestSelling => "best_selling",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }

    /// Label for the sort dropdown.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::BestSelling => "Best sellers",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s.trim())
            .ok_or(())
    }
}

/// Filters for a product listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    /// Category slug.
    pub category: Option<String>,
    pub color: Option<ColorId>,
    pub size: Option<SizeId>,
    pub sort: SortOrder,
    pub search: Option<String>,
    pub on_sale: bool,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            category: None,
            color: None,
            size: None,
            sort: SortOrder::default(),
            search: None,
            on_sale: false,
        }
    }
}

impl ProductQuery {
    /// Query parameters in a stable order. Unset filters are omitted.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(color) = self.color {
            pairs.push(("color", color.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.to_string()));
        }
        pairs.push(("sort", self.sort.as_str().to_string()));
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if self.on_sale {
            pairs.push(("sale", "true".to_string()));
        }
        pairs
    }

    /// URL-encoded query string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }

    /// The same filters on another page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

#[derive(Deserialize)]
struct ProductPayload {
    product: Product,
}

impl ApiClient {
    /// List products matching the filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(query = %query.to_query_string()))]
    pub async fn products(
        &self,
        query: &ProductQuery,
    ) -> Result<Paginated<ProductSummary>, ApiError> {
        let cache_key = CacheKey::Products(query.to_query_string());

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(page);
        }

        let mut url = self.endpoint(&["public", "products"])?;
        url.query_pairs_mut().extend_pairs(query.pairs());

        let mut page: Paginated<ProductSummary> = self
            .fetch(self.request(reqwest::Method::GET, url, None))
            .await?;
        for summary in &mut page.items {
            summary.thumbnail = summary
                .thumbnail
                .as_deref()
                .map(|reference| resolve_image_url(self.storage_base_url(), reference));
        }

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Get a product by its slug.
    ///
    /// Variant images are normalized (contiguous order, one primary first) and
    /// resolved against the storage bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(slug.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["public", "products", slug])?;
        let payload: ProductPayload = self
            .fetch(self.request(reqwest::Method::GET, url, None))
            .await?;

        let mut product = payload.product;
        prepare_images(&mut product, self.storage_base_url());

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List catalog categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let url = self.endpoint(&["public", "categories"])?;
        let categories: Vec<Category> = self
            .fetch(self.request(reqwest::Method::GET, url, None))
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// List color options.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn colors(&self) -> Result<Vec<ColorOption>, ApiError> {
        if let Some(CacheValue::Colors(colors)) = self.inner.cache.get(&CacheKey::Colors).await {
            return Ok(colors);
        }

        let url = self.endpoint(&["public", "colors"])?;
        let colors: Vec<ColorOption> = self
            .fetch(self.request(reqwest::Method::GET, url, None))
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Colors, CacheValue::Colors(colors.clone()))
            .await;
        Ok(colors)
    }

    /// List size options.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn sizes(&self) -> Result<Vec<SizeOption>, ApiError> {
        if let Some(CacheValue::Sizes(sizes)) = self.inner.cache.get(&CacheKey::Sizes).await {
            return Ok(sizes);
        }

        let url = self.endpoint(&["public", "sizes"])?;
        let sizes: Vec<SizeOption> = self
            .fetch(self.request(reqwest::Method::GET, url, None))
            .await?;

        self.inner
            .cache
            .insert(CacheKey::Sizes, CacheValue::Sizes(sizes.clone()))
            .await;
        Ok(sizes)
    }
}

/// Normalize image ordering and resolve image URLs for every variant.
#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::tests::client_for;
    use super::*;

    fn product_json() -> serde_json::Value {
        json!({
            "id": 1,
            "name": "Linen Shirt",
            "slug": "linen-shirt",
            "price": "49.00",
            "variants": [{
                "id": 10,
                "productId": 1,
                "price": "49.00",
                "quantity": 2,
                "images": [
                    {"id": 1, "url": "shirts/back.jpg", "isPrimary": false, "order": 3},
                    {"id": 2, "url": "https://cdn.local/front.jpg", "isPrimary": true, "order": 7}
                ]
            }]
        })
    }

    #[test]
    fn test_query_pairs_skip_unset_filters() {
        let query = ProductQuery {
            color: Some(ColorId::new(3)),
            search: Some("linen shirt".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(
            query.to_query_string(),
            "page=1&limit=12&color=3&sort=newest&search=linen+shirt"
        );
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("price_desc".parse(), Ok(SortOrder::PriceDesc));
        assert!("cheapest".parse::<SortOrder>().is_err());
    }

    #[tokio::test]
    async fn test_product_normalizes_and_resolves_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/products/linen-shirt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"product": product_json()}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let product = client.product("linen-shirt").await.unwrap();
        let images = &product.variants[0].images;

        assert_eq!(images[0].url, "https://cdn.local/front.jpg");
        assert!(images[0].is_primary);
        assert_eq!(images[0].order, 0);
        assert_eq!(images[1].url, "https://bucket.local/shirts/back.jpg");
        assert_eq!(images[1].order, 1);

        // Second read is served from cache (mock expects exactly one call).
        client.product("linen-shirt").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/products/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "Product not found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).product("nope").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(message) if message == "Product not found"));
    }

    #[tokio::test]
    async fn test_products_listing_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/products"))
            .and(query_param("category", "shirts"))
            .and(query_param("sort", "price_asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "products": [{
                        "id": 1, "name": "Linen Shirt", "slug": "linen-shirt",
                        "price": "49.00", "image": "shirts/front.jpg"
                    }],
                    "pagination": {"page": 1, "limit": 12, "total": 1, "pages": 1}
                }
            })))
            .mount(&server)
            .await;

        let query = ProductQuery {
            category: Some("shirts".to_string()),
            sort: SortOrder::PriceAsc,
            ..ProductQuery::default()
        };
        let page = client_for(&server.uri()).products(&query).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(
            page.items[0].thumbnail.as_deref(),
            Some("https://bucket.local/shirts/front.jpg")
        );
    }

    #[tokio::test]
    async fn test_rejected_envelope_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Catalog unavailable"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).categories().await.unwrap_err();
        assert_eq!(err.user_message(), "Catalog unavailable");
    }
}
