//! Home page product rows.
//!
//! Rows are fetched concurrently and settle independently: a row whose
//! request fails renders its empty state while the others still show.

use futures::future::join_all;
use threadline_core::{Category, ProductSummary};

use crate::api::{ApiClient, DEFAULT_PAGE_SIZE, ProductQuery, SortOrder};

/// Products shown per row.
const ROW_SIZE: u32 = 8;

/// Number of top-level categories that get their own row.
const FEATURED_CATEGORY_ROWS: usize = 2;

/// A row to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpec {
    pub title: String,
    /// "View all" link for the row.
    pub link: String,
    pub query: ProductQuery,
}

/// A fetched row.
#[derive(Debug, Clone)]
pub struct HomeRow {
    pub title: String,
    pub link: String,
    pub products: Vec<ProductSummary>,
    /// The request for this row failed.
    pub failed: bool,
}

fn listing_link(query: &ProductQuery) -> String {
    let link = ProductQuery {
        page: 1,
        limit: DEFAULT_PAGE_SIZE,
        ..query.clone()
    };
    format!("/products?{}", link.to_query_string())
}

fn row(title: &str, query: ProductQuery) -> RowSpec {
    RowSpec {
        title: title.to_string(),
        link: listing_link(&query),
        query,
    }
}

/// Rows in display order: the fixed rows, then one per featured category.
#[must_use]
pub fn row_specs(categories: &[Category]) -> Vec<RowSpec> {
    let base = ProductQuery {
        limit: ROW_SIZE,
        ..ProductQuery::default()
    };

    let mut specs = vec![
        row(
            "New arrivals",
            ProductQuery {
                sort: SortOrder::Newest,
                ..base.clone()
            },
        ),
        row(
            "Best sellers",
            ProductQuery {
                sort: SortOrder::BestSelling,
                ..base.clone()
            },
        ),
        row(
            "On sale",
            ProductQuery {
                on_sale: true,
                ..base.clone()
            },
        ),
    ];

    specs.extend(
        categories
            .iter()
            .filter(|category| category.parent_id.is_none())
            .take(FEATURED_CATEGORY_ROWS)
            .map(|category| {
                row(
                    &category.name,
                    ProductQuery {
                        category: Some(category.slug.clone()),
                        ..base.clone()
                    },
                )
            }),
    );

    specs
}

/// Fetch every home row concurrently.
pub async fn load_rows(api: &ApiClient) -> Vec<HomeRow> {
    let categories = api.categories().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch categories for home rows: {e}");
        Vec::new()
    });
    let specs = row_specs(&categories);

    let results = join_all(specs.iter().map(|spec| api.products(&spec.query))).await;

    specs
        .into_iter()
        .zip(results)
        .map(|(spec, result)| match result {
            Ok(page) => HomeRow {
                title: spec.title,
                link: spec.link,
                products: page.items,
                failed: false,
            },
            Err(e) => {
                tracing::error!(row = %spec.title, "Failed to fetch home row: {e}");
                HomeRow {
                    title: spec.title,
                    link: spec.link,
                    products: Vec::new(),
                    failed: true,
                }
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use threadline_core::CategoryId;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ApiConfig;

    fn category(id: i64, slug: &str, parent: Option<i64>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            parent_id: parent.map(CategoryId::new),
        }
    }

    #[test]
    fn test_row_specs_feature_top_level_categories() {
        let categories = vec![
            category(1, "shirts", None),
            category(2, "linen", Some(1)),
            category(3, "pants", None),
            category(4, "hats", None),
        ];
        let specs = row_specs(&categories);
        let titles: Vec<&str> = specs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["New arrivals", "Best sellers", "On sale", "SHIRTS", "PANTS"]
        );
        assert!(specs[3].link.contains("category=shirts"));
        assert!(specs.iter().all(|s| s.query.limit == ROW_SIZE));
    }

    #[tokio::test]
    async fn test_failed_row_does_not_affect_others() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/categories"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/public/products"))
            .and(query_param("sort", "best_selling"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/public/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "products": [{"id": 1, "name": "Tee", "slug": "tee", "price": "10.00"}],
                    "pagination": {"page": 1, "limit": 8, "total": 1, "pages": 1}
                }
            })))
            .mount(&server)
            .await;

        let api = ApiClient::new(&ApiConfig {
            base_url: Url::parse(&server.uri()).unwrap(),
            storage_base_url: "https://bucket.local".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let rows = load_rows(&api).await;
        assert_eq!(rows.len(), 3);
        assert!(!rows[0].failed);
        assert_eq!(rows[0].products.len(), 1);
        assert!(rows[1].failed);
        assert!(rows[1].products.is_empty());
        assert!(!rows[2].failed);
    }
}
