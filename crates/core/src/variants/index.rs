//! The purchasable-variant table and availability queries over it.

use std::collections::HashSet;

use super::AxisValue;
use crate::types::{ColorId, Product, SizeId, Variant};

/// One purchasable `(color, size)` combination.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry<'a> {
    pub color: AxisValue<ColorId>,
    pub size: AxisValue<SizeId>,
    pub variant: &'a Variant,
}

/// Flat list of active, in-stock variants keyed by their axis values.
///
/// Lookups are linear scans; products carry tens of variants, not thousands.
#[derive(Debug, Clone, Default)]
pub struct VariantIndex<'a> {
    entries: Vec<IndexEntry<'a>>,
}

impl<'a> VariantIndex<'a> {
    /// Index a product's variants.
    ///
    /// When the product has no color options every variant sits on the
    /// implicit color value, whatever color id it carries; likewise for sizes.
    #[must_use]
    pub fn for_product(product: &'a Product) -> Self {
        let has_colors = !product.colors.is_empty();
        let has_sizes = !product.sizes.is_empty();
        Self::build(&product.variants, |variant| {
            (
                if has_colors {
                    variant.color_id.into()
                } else {
                    AxisValue::Implicit
                },
                if has_sizes {
                    variant.size_id.into()
                } else {
                    AxisValue::Implicit
                },
            )
        })
    }

    /// Index raw variants, mapping missing ids to the implicit axis value.
    #[must_use]
    pub fn from_variants(variants: &'a [Variant]) -> Self {
        Self::build(variants, |variant| {
            (variant.color_id.into(), variant.size_id.into())
        })
    }

    fn build(
        variants: &'a [Variant],
        key: impl Fn(&Variant) -> (AxisValue<ColorId>, AxisValue<SizeId>),
    ) -> Self {
        let entries = variants
            .iter()
            .filter(|variant| variant.is_purchasable())
            .map(|variant| {
                let (color, size) = key(variant);
                IndexEntry {
                    color,
                    size,
                    variant,
                }
            })
            .collect();
        Self { entries }
    }

    /// All purchasable entries, in payload order.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry<'a>] {
        &self.entries
    }

    /// Number of purchasable entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is purchasable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sizes purchasable together with `color`.
    #[must_use]
    pub fn sizes_available_for(&self, color: AxisValue<ColorId>) -> HashSet<AxisValue<SizeId>> {
        self.entries
            .iter()
            .filter(|entry| entry.color == color)
            .map(|entry| entry.size)
            .collect()
    }

    /// Colors purchasable together with `size`.
    #[must_use]
    pub fn colors_available_for(&self, size: AxisValue<SizeId>) -> HashSet<AxisValue<ColorId>> {
        self.entries
            .iter()
            .filter(|entry| entry.size == size)
            .map(|entry| entry.color)
            .collect()
    }

    /// Exact-match lookup. Duplicate pairs resolve to the first in payload order.
    #[must_use]
    pub fn resolve(&self, color: AxisValue<ColorId>, size: AxisValue<SizeId>) -> Option<&'a Variant> {
        self.entries
            .iter()
            .find(|entry| entry.color == color && entry.size == size)
            .map(|entry| entry.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        BLUE, GREEN, LARGE, MEDIUM, RED, SMALL, color, product, red_blue_product, size, variant,
    };
    use crate::types::VariantId;

    #[test]
    fn test_index_skips_inactive_and_out_of_stock() {
        let mut inactive = variant(3, Some(RED), Some(LARGE), 4);
        inactive.is_active = false;
        let p = product(
            vec![color(RED, "Red", None)],
            vec![size(SMALL, "S", None), size(MEDIUM, "M", None), size(LARGE, "L", None)],
            vec![
                variant(1, Some(RED), Some(SMALL), 2),
                variant(2, Some(RED), Some(MEDIUM), 0),
                inactive,
            ],
        );

        let index = VariantIndex::for_product(&p);
        assert_eq!(index.len(), 1);
        assert_eq!(index.entries()[0].variant.id, VariantId::new(1));
    }

    #[test]
    fn test_empty_variants_give_empty_index() {
        let p = product(vec![], vec![], vec![]);
        assert!(VariantIndex::for_product(&p).is_empty());
    }

    #[test]
    fn test_availability_queries_are_symmetric() {
        let p = red_blue_product();
        let index = VariantIndex::for_product(&p);

        let red_sizes = index.sizes_available_for(AxisValue::Value(RED));
        assert_eq!(red_sizes, HashSet::from([AxisValue::Value(SMALL)]));

        let medium_colors = index.colors_available_for(AxisValue::Value(MEDIUM));
        assert_eq!(medium_colors, HashSet::from([AxisValue::Value(BLUE)]));

        assert!(index.sizes_available_for(AxisValue::Value(GREEN)).is_empty());
    }

    #[test]
    fn test_absent_pairs_resolve_to_none() {
        let p = red_blue_product();
        let index = VariantIndex::for_product(&p);
        let present = [(RED, SMALL), (BLUE, MEDIUM)];

        for c in [RED, BLUE, GREEN] {
            for s in [SMALL, MEDIUM, LARGE] {
                let resolved = index.resolve(AxisValue::Value(c), AxisValue::Value(s));
                if present.contains(&(c, s)) {
                    assert!(resolved.is_some(), "({c}, {s}) should resolve");
                } else {
                    assert!(resolved.is_none(), "({c}, {s}) should not resolve");
                }
            }
        }
    }

    #[test]
    fn test_missing_axis_is_implicit() {
        let p = product(
            vec![color(RED, "Red", None), color(BLUE, "Blue", None)],
            vec![],
            vec![variant(1, Some(RED), None, 1), variant(2, Some(BLUE), Some(SMALL), 1)],
        );
        let index = VariantIndex::for_product(&p);

        // Size ids are ignored on a product without size options.
        let blue = index.resolve(AxisValue::Value(BLUE), AxisValue::Implicit);
        assert_eq!(blue.map(|v| v.id), Some(VariantId::new(2)));
    }

    #[test]
    fn test_duplicate_pairs_resolve_to_first() {
        let p = product(
            vec![color(RED, "Red", None)],
            vec![size(SMALL, "S", None)],
            vec![variant(7, Some(RED), Some(SMALL), 1), variant(8, Some(RED), Some(SMALL), 1)],
        );
        let index = VariantIndex::for_product(&p);
        let resolved = index.resolve(AxisValue::Value(RED), AxisValue::Value(SMALL));
        assert_eq!(resolved.map(|v| v.id), Some(VariantId::new(7)));
    }

    #[test]
    fn test_from_variants_maps_missing_ids_to_implicit() {
        let variants = vec![variant(1, None, Some(SMALL), 1)];
        let index = VariantIndex::from_variants(&variants);
        assert!(index.resolve(AxisValue::Implicit, AxisValue::Value(SMALL)).is_some());
    }
}
