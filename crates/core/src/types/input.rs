//! Write models the admin sends to the backend API.

use rust_decimal::Decimal;
use serde::Serialize;

use super::catalog::{ColorOption, Product, SizeOption, Variant};
use super::id::CategoryId;
use crate::validation::{self, ValidationError};

/// Raw product fields as submitted by a form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFields<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
    pub price: &'a str,
    pub sale_price: Option<&'a str>,
    pub category_id: Option<&'a str>,
    pub is_active: bool,
}

/// A validated product aggregate ready to be created or saved.
///
/// Saves replace the whole aggregate on the backend, so the option axes and
/// variants (with their images) travel with the product fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    pub is_active: bool,
    pub colors: Vec<ColorOption>,
    pub sizes: Vec<SizeOption>,
    pub variants: Vec<Variant>,
}

impl ProductInput {
    /// Validate form fields into a product with no options or variants.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field. Name, slug and price are required.
    pub fn parse(fields: ProductFields<'_>) -> Result<Self, ValidationError> {
        let name = validation::required("name", fields.name)?;
        let slug = validation::slug("slug", fields.slug)?;
        let price = validation::amount("price", fields.price)?;
        let sale_price = validation::optional_amount("sale price", fields.sale_price)?;
        let category_id = validation::optional(fields.category_id)
            .map(|raw| {
                raw.parse::<CategoryId>()
                    .map_err(|_| ValidationError::Invalid {
                        field: "category",
                        reason: format!("unknown category '{raw}'"),
                    })
            })
            .transpose()?;

        Ok(Self {
            name,
            slug,
            description: fields.description.trim().to_string(),
            price,
            sale_price,
            category_id,
            is_active: fields.is_active,
            colors: Vec::new(),
            sizes: Vec::new(),
            variants: Vec::new(),
        })
    }

    /// Carry over option axes and variants from an edited aggregate.
    #[must_use]
    pub fn with_aggregate(mut self, product: &Product) -> Self {
        self.colors.clone_from(&product.colors);
        self.sizes.clone_from(&product.sizes);
        self.variants.clone_from(&product.variants);
        self
    }
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price,
            sale_price: product.sale_price,
            category_id: product.category_id,
            is_active: product.is_active,
            colors: product.colors.clone(),
            sizes: product.sizes.clone(),
            variants: product.variants.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures::red_blue_product;

    fn fields() -> ProductFields<'static> {
        ProductFields {
            name: " Linen Shirt ",
            slug: "linen-shirt",
            description: "Breathable.",
            price: "49.50",
            sale_price: Some(""),
            category_id: Some("4"),
            is_active: true,
        }
    }

    #[test]
    fn test_parse_valid_fields() {
        let input = ProductInput::parse(fields()).unwrap();
        assert_eq!(input.name, "Linen Shirt");
        assert_eq!(input.price, Decimal::new(4950, 2));
        assert_eq!(input.sale_price, None);
        assert_eq!(input.category_id, Some(CategoryId::new(4)));
    }

    #[test]
    fn test_parse_requires_name_slug_price() {
        let missing_name = ProductFields { name: " ", ..fields() };
        assert_eq!(ProductInput::parse(missing_name).unwrap_err().field(), "name");

        let missing_slug = ProductFields { slug: "", ..fields() };
        assert_eq!(ProductInput::parse(missing_slug).unwrap_err().field(), "slug");

        let missing_price = ProductFields { price: "", ..fields() };
        assert_eq!(ProductInput::parse(missing_price).unwrap_err().field(), "price");
    }

    #[test]
    fn test_parse_rejects_bad_category() {
        let bad = ProductFields {
            category_id: Some("shirts"),
            ..fields()
        };
        assert_eq!(ProductInput::parse(bad).unwrap_err().field(), "category");
    }

    #[test]
    fn test_with_aggregate_keeps_variants() {
        let product = red_blue_product();
        let input = ProductInput::parse(fields()).unwrap().with_aggregate(&product);
        assert_eq!(input.variants.len(), product.variants.len());
        assert_eq!(input.colors, product.colors);

        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("salePrice").is_none());
        assert_eq!(json["variants"].as_array().map(Vec::len), Some(product.variants.len()));
    }
}
