//! Keeps a shopper's color and size selection consistent.
//!
//! Changing one axis keeps the other axis' selection when the new pair is
//! purchasable; otherwise the other axis falls back to its first available
//! option in display order, or is cleared when nothing is available.

use std::collections::HashSet;
use std::hash::Hash;

use super::index::VariantIndex;
use super::{AxisValue, display_sorted};
use crate::types::{ColorId, ColorOption, Product, SizeId, SizeOption, Variant, VariantId};

/// Current selection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub color: Option<AxisValue<ColorId>>,
    pub size: Option<AxisValue<SizeId>>,
    pub variant: Option<VariantId>,
}

impl Selection {
    /// Selected color id, if a concrete color is selected.
    #[must_use]
    pub fn color_id(&self) -> Option<ColorId> {
        self.color.and_then(AxisValue::value)
    }

    /// Selected size id, if a concrete size is selected.
    #[must_use]
    pub fn size_id(&self) -> Option<SizeId> {
        self.size.and_then(AxisValue::value)
    }
}

/// A user-initiated change on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Color(ColorId),
    Size(SizeId),
}

/// Render state of one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice<'a, T> {
    pub option: &'a T,
    pub selected: bool,
    /// Whether picking this option yields a purchasable pair with the current
    /// selection on the other axis.
    pub available: bool,
}

/// Selection reconciler over one product.
#[derive(Debug, Clone)]
pub struct VariantSelector<'a> {
    product: &'a Product,
    index: VariantIndex<'a>,
    colors: Vec<&'a ColorOption>,
    sizes: Vec<&'a SizeOption>,
    color_axis: Vec<AxisValue<ColorId>>,
    size_axis: Vec<AxisValue<SizeId>>,
    selection: Selection,
}

impl<'a> VariantSelector<'a> {
    /// Start with the default selection: the first color (in display order)
    /// that has any purchasable size, reconciled as a color change.
    #[must_use]
    pub fn new(product: &'a Product) -> Self {
        let mut selector = Self::empty(product);
        let first_color = selector
            .color_axis
            .iter()
            .copied()
            .find(|color| !selector.index.sizes_available_for(*color).is_empty());
        if let Some(color) = first_color {
            selector.select_color_value(color);
        }
        selector
    }

    /// Rebuild a previously rendered selection without reconciling it.
    ///
    /// Used to replay a change against the state the shopper was looking at.
    /// The variant is resolved by exact match only.
    #[must_use]
    pub fn restore(product: &'a Product, color: Option<ColorId>, size: Option<SizeId>) -> Self {
        let mut selector = Self::empty(product);
        let color = selector.color_value(color);
        let size = selector.size_value(size);
        selector.selection = Selection {
            color,
            size,
            variant: color
                .zip(size)
                .and_then(|(c, s)| selector.index.resolve(c, s))
                .map(|v| v.id),
        };
        selector
    }

    fn empty(product: &'a Product) -> Self {
        let colors = display_sorted(&product.colors, |c| c.display_order);
        let sizes = display_sorted(&product.sizes, |s| s.display_order);
        let color_axis = axis(&colors, |c| c.id);
        let size_axis = axis(&sizes, |s| s.id);
        Self {
            product,
            index: VariantIndex::for_product(product),
            colors,
            sizes,
            color_axis,
            size_axis,
            selection: Selection::default(),
        }
    }

    /// Apply a shopper's change.
    pub fn apply(&mut self, change: SelectionChange) {
        match change {
            SelectionChange::Color(color) => self.select_color(color),
            SelectionChange::Size(size) => self.select_size(size),
        }
    }

    /// Select a color, reconciling the size.
    pub fn select_color(&mut self, color: ColorId) {
        let value = self.color_value(Some(color)).unwrap_or(AxisValue::Value(color));
        self.select_color_value(value);
    }

    /// Select a size, reconciling the color.
    pub fn select_size(&mut self, size: SizeId) {
        let value = self.size_value(Some(size)).unwrap_or(AxisValue::Value(size));
        self.select_size_value(value);
    }

    fn select_color_value(&mut self, color: AxisValue<ColorId>) {
        let available = self.index.sizes_available_for(color);
        let size = reconcile(&available, self.selection.size, &self.size_axis);
        self.selection = Selection {
            color: Some(color),
            size,
            variant: size
                .and_then(|s| self.index.resolve(color, s))
                .map(|v| v.id),
        };
    }

    fn select_size_value(&mut self, size: AxisValue<SizeId>) {
        let available = self.index.colors_available_for(size);
        let color = reconcile(&available, self.selection.color, &self.color_axis);
        self.selection = Selection {
            color,
            size: Some(size),
            variant: color
                .and_then(|c| self.index.resolve(c, size))
                .map(|v| v.id),
        };
    }

    /// Map a requested color id onto this product's color axis.
    fn color_value(&self, color: Option<ColorId>) -> Option<AxisValue<ColorId>> {
        if self.colors.is_empty() {
            Some(AxisValue::Implicit)
        } else {
            color.map(AxisValue::Value)
        }
    }

    /// Map a requested size id onto this product's size axis.
    fn size_value(&self, size: Option<SizeId>) -> Option<AxisValue<SizeId>> {
        if self.sizes.is_empty() {
            Some(AxisValue::Implicit)
        } else {
            size.map(AxisValue::Value)
        }
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// The product being configured.
    #[must_use]
    pub const fn product(&self) -> &'a Product {
        self.product
    }

    /// The resolved variant, if the current pair is purchasable.
    #[must_use]
    pub fn variant(&self) -> Option<&'a Variant> {
        self.selection
            .variant
            .and_then(|id| self.product.variant(id))
    }

    /// Whether no combination of this product can be bought.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.index.is_empty()
    }

    /// Color options in display order with their render state.
    #[must_use]
    pub fn color_choices(&self) -> Vec<Choice<'a, ColorOption>> {
        let compatible = self
            .selection
            .size
            .map(|size| self.index.colors_available_for(size));
        self.colors
            .iter()
            .copied()
            .map(|option| {
                let value = AxisValue::Value(option.id);
                Choice {
                    option,
                    selected: self.selection.color == Some(value),
                    available: compatible.as_ref().map_or_else(
                        || !self.index.sizes_available_for(value).is_empty(),
                        |set| set.contains(&value),
                    ),
                }
            })
            .collect()
    }

    /// Size options in display order with their render state.
    #[must_use]
    pub fn size_choices(&self) -> Vec<Choice<'a, SizeOption>> {
        let compatible = self
            .selection
            .color
            .map(|color| self.index.sizes_available_for(color));
        self.sizes
            .iter()
            .copied()
            .map(|option| {
                let value = AxisValue::Value(option.id);
                Choice {
                    option,
                    selected: self.selection.size == Some(value),
                    available: compatible.as_ref().map_or_else(
                        || !self.index.colors_available_for(value).is_empty(),
                        |set| set.contains(&value),
                    ),
                }
            })
            .collect()
    }
}

/// Axis values in display order; a product without options has the single
/// implicit value.
fn axis<T, Id>(options: &[&T], id: impl Fn(&T) -> Id) -> Vec<AxisValue<Id>> {
    if options.is_empty() {
        vec![AxisValue::Implicit]
    } else {
        options
            .iter()
            .map(|option| AxisValue::Value(id(*option)))
            .collect()
    }
}

/// Keep `previous` if still available, else take the first available value in
/// axis order, else nothing.
fn reconcile<Id: Copy + Eq + Hash>(
    available: &HashSet<AxisValue<Id>>,
    previous: Option<AxisValue<Id>>,
    ordered: &[AxisValue<Id>],
) -> Option<AxisValue<Id>> {
    previous
        .filter(|value| available.contains(value))
        .or_else(|| ordered.iter().copied().find(|value| available.contains(value)))
}
