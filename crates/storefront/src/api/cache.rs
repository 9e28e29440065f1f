//! Cache types for catalog responses.

use threadline_core::{Category, ColorOption, Paginated, Product, ProductSummary, SizeOption};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    /// Listing keyed by its encoded query string.
    Products(String),
    Categories,
    Colors,
    Sizes,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Paginated<ProductSummary>),
    Categories(Vec<Category>),
    Colors(Vec<ColorOption>),
    Sizes(Vec<SizeOption>),
}
