//! Catalog entities as exchanged with the backend API.
//!
//! Field names follow the backend's camelCase JSON. Collections default to
//! empty so partially populated payloads (listing rows, admin drafts) still
//! deserialize.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{CategoryId, ColorId, ImageId, ProductId, SizeId, VariantId};
use super::price::PricePoint;

/// A product with its option axes and purchasable variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Base price before any sale.
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub colors: Vec<ColorOption>,
    #[serde(default)]
    pub sizes: Vec<SizeOption>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// Effective product-level price.
    #[must_use]
    pub fn price_point(&self) -> PricePoint {
        PricePoint::resolve(self.price, self.sale_price)
    }

    /// Look up a color option by id.
    #[must_use]
    pub fn color(&self, id: ColorId) -> Option<&ColorOption> {
        self.colors.iter().find(|c| c.id == id)
    }

    /// Look up a size option by id.
    #[must_use]
    pub fn size(&self, id: SizeId) -> Option<&SizeOption> {
        self.sizes.iter().find(|s| s.id == id)
    }

    /// Look up a variant by id.
    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// Mutable variant lookup.
    pub fn variant_mut(&mut self, id: VariantId) -> Option<&mut Variant> {
        self.variants.iter_mut().find(|v| v.id == id)
    }

    /// Human label for a variant's option values, e.g. "Red / M".
    #[must_use]
    pub fn variant_label(&self, variant: &Variant) -> Option<String> {
        let parts: Vec<&str> = [
            variant
                .color_id
                .and_then(|id| self.color(id))
                .map(|c| c.name.as_str()),
            variant
                .size_id
                .and_then(|id| self.size(id))
                .map(|s| s.name.as_str()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }

    /// Cover image: the primary image of the first variant that has one.
    #[must_use]
    pub fn cover_image(&self) -> Option<&VariantImage> {
        self.variants.iter().find_map(Variant::primary_image)
    }

    /// Total units on hand across active variants.
    #[must_use]
    pub fn total_stock(&self) -> i64 {
        self.variants
            .iter()
            .filter(|v| v.is_active)
            .map(|v| v.quantity.max(0))
            .sum()
    }
}

/// Listing projection of a product, as returned by paginated endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default, alias = "image")]
    pub thumbnail: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProductSummary {
    /// Effective listing price.
    #[must_use]
    pub fn price_point(&self) -> PricePoint {
        PricePoint::resolve(self.price, self.sale_price)
    }
}

/// A selectable color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorOption {
    pub id: ColorId,
    pub name: String,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub hex_code: Option<String>,
}

/// A selectable size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOption {
    pub id: SizeId,
    pub name: String,
    #[serde(default)]
    pub display_order: Option<i32>,
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// A purchasable SKU, identified by an optional color and an optional size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    #[serde(default)]
    pub color_id: Option<ColorId>,
    #[serde(default)]
    pub size_id: Option<SizeId>,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    /// Units on hand. The backend may report negative stock after oversells.
    #[serde(default)]
    pub quantity: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub images: Vec<VariantImage>,
}

impl Variant {
    /// Whether the variant can be added to a cart.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.is_active && self.quantity > 0
    }

    /// Effective variant price.
    #[must_use]
    pub fn price_point(&self) -> PricePoint {
        PricePoint::resolve(self.price, self.sale_price)
    }

    /// The image flagged as primary, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&VariantImage> {
        self.images.iter().find(|img| img.is_primary)
    }
}

/// Identity of a variant image.
///
/// Images that have not been uploaded yet carry a client-generated UUID; the
/// backend assigns a numeric id once the upload succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageKey {
    Persisted(ImageId),
    Pending(Uuid),
}

impl ImageKey {
    /// Generate a fresh key for an image that has not reached the backend.
    #[must_use]
    pub fn pending() -> Self {
        Self::Pending(Uuid::new_v4())
    }

    /// Backend id, if the image has been persisted.
    #[must_use]
    pub const fn persisted(self) -> Option<ImageId> {
        match self {
            Self::Persisted(id) => Some(id),
            Self::Pending(_) => None,
        }
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persisted(id) => write!(f, "{id}"),
            Self::Pending(uuid) => write!(f, "pending-{uuid}"),
        }
    }
}

/// An image attached to a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantImage {
    pub id: ImageKey,
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub order: u32,
}

impl VariantImage {
    /// Build an image that exists only locally until its upload completes.
    #[must_use]
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            id: ImageKey::pending(),
            url: url.into(),
            alt_text: None,
            is_primary: false,
            order: 0,
        }
    }
}

const fn default_true() -> bool {
    true
}
