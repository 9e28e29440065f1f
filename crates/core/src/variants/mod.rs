//! Variant availability resolution.
//!
//! A product exposes up to two option axes (color and size) and a sparse set
//! of variants, each pinned to at most one value per axis. This module
//! answers which combinations are purchasable and keeps a shopper's selection
//! consistent when one axis changes.
//!
//! - [`index`] builds the purchasable `(color, size) -> variant` table and
//!   answers availability queries against it.
//! - [`selection`] reconciles the selected color and size on every change.
//!
//! A product without colors (or without sizes) is treated as having exactly
//! one implicit value on that axis, so every product goes through the same
//! two-axis logic.

pub mod index;
pub mod selection;

pub use index::{IndexEntry, VariantIndex};
pub use selection::{Choice, Selection, SelectionChange, VariantSelector};

/// A value on one option axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AxisValue<T> {
    /// The axis is absent on this product; its single implicit value.
    Implicit,
    /// A concrete option id.
    Value(T),
}

impl<T> AxisValue<T> {
    /// The concrete option id, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Implicit => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl<T> From<Option<T>> for AxisValue<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Implicit, Self::Value)
    }
}

/// Sort options by display order, keeping payload order for ties.
///
/// Options without a display order come after ordered ones.
pub fn display_sorted<T>(options: &[T], display_order: impl Fn(&T) -> Option<i32>) -> Vec<&T> {
    let mut sorted: Vec<&T> = options.iter().collect();
    sorted.sort_by_key(|option| display_order(option).unwrap_or(i32::MAX));
    sorted
}
