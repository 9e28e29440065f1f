//! Primary flag and display order maintenance for ordered media lists.
//!
//! Lists handled here keep one item flagged primary at position 0 and carry
//! `order` values equal to their positions. Every operation rewrites those
//! fields after moving items, so callers can persist the list as-is.

use thiserror::Error;

use crate::types::VariantImage;

/// An item that carries a primary flag and a display order.
pub trait Ranked {
    fn is_primary(&self) -> bool;
    fn set_primary(&mut self, primary: bool);
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
}

impl Ranked for VariantImage {
    fn is_primary(&self) -> bool {
        self.is_primary
    }

    fn set_primary(&mut self, primary: bool) {
        self.is_primary = primary;
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

/// An ordering operation referenced a position that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderingError {
    #[error("position {index} is out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

fn check<T>(items: &[T], index: usize) -> Result<(), OrderingError> {
    if index < items.len() {
        Ok(())
    } else {
        Err(OrderingError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }
}

fn position(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Rewrite `order` so it matches list position.
fn renumber<T: Ranked>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(position(index));
    }
}

/// Flag position 0 as primary and clear the flag everywhere else.
fn promote_first<T: Ranked>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_primary(index == 0);
    }
}

/// Make the item at `index` the primary one by moving it to the front.
///
/// # Errors
///
/// Returns [`OrderingError::IndexOutOfRange`] and leaves the list untouched if
/// `index` is past the end.
pub fn set_primary<T: Ranked>(items: &mut Vec<T>, index: usize) -> Result<(), OrderingError> {
    check(items, index)?;
    let item = items.remove(index);
    items.insert(0, item);
    renumber(items);
    promote_first(items);
    Ok(())
}

/// Remove the item at `index` and return it.
///
/// If the removed item was primary, the new first item takes over.
///
/// # Errors
///
/// Returns [`OrderingError::IndexOutOfRange`] if `index` is past the end.
pub fn remove<T: Ranked>(items: &mut Vec<T>, index: usize) -> Result<T, OrderingError> {
    check(items, index)?;
    let removed = items.remove(index);
    renumber(items);
    if removed.is_primary() && !items.is_empty() {
        promote_first(items);
    }
    Ok(removed)
}

/// Move the item at `from` to position `to`, shifting the others.
///
/// When the move changes which item sits at position 0, that item becomes
/// primary.
///
/// # Errors
///
/// Returns [`OrderingError::IndexOutOfRange`] if either position is past the end.
pub fn reorder<T: Ranked>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), OrderingError> {
    check(items, from)?;
    check(items, to)?;
    if from == to {
        return Ok(());
    }
    let item = items.remove(from);
    items.insert(to, item);
    renumber(items);
    if from == 0 || to == 0 {
        promote_first(items);
    }
    Ok(())
}

/// Append an item at the end. The first item of an empty list is primary.
pub fn append<T: Ranked>(items: &mut Vec<T>, mut item: T) {
    item.set_order(position(items.len()));
    item.set_primary(items.is_empty());
    items.push(item);
}

/// Restore the invariants on a list received from elsewhere.
///
/// Sorts by the existing `order` (stable), moves the first primary item to
/// the front, renumbers, and leaves exactly position 0 primary.
pub fn normalize<T: Ranked>(items: &mut Vec<T>) {
    items.sort_by_key(Ranked::order);
    if let Some(index) = items.iter().position(Ranked::is_primary)
        && index > 0
    {
        let item = items.remove(index);
        items.insert(0, item);
    }
    renumber(items);
    promote_first(items);
}

/// Whether the list satisfies the invariants: contiguous orders and exactly
/// one primary item at position 0 (or an empty list).
pub fn is_normalized<T: Ranked>(items: &[T]) -> bool {
    let contiguous = items
        .iter()
        .enumerate()
        .all(|(index, item)| item.order() == position(index));
    let primaries: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_primary())
        .map(|(index, _)| index)
        .collect();
    contiguous && (items.is_empty() || primaries == [0])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::fixtures::{image, images};
    use crate::types::{ImageId, ImageKey};

    fn ids(items: &[VariantImage]) -> Vec<i64> {
        items
            .iter()
            .map(|img| img.id.persisted().map_or(-1, |id| id.as_i64()))
            .collect()
    }

    fn orders(items: &[VariantImage]) -> Vec<u32> {
        items.iter().map(|img| img.order).collect()
    }

    #[test]
    fn test_set_primary_moves_item_to_front() {
        let mut items = images(4);
        set_primary(&mut items, 2).unwrap();

        assert_eq!(ids(&items), vec![3, 1, 2, 4]);
        assert_eq!(orders(&items), vec![0, 1, 2, 3]);
        let primaries: Vec<_> = items.iter().filter(|img| img.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, ImageKey::Persisted(ImageId::new(3)));
    }

    #[test]
    fn test_set_primary_out_of_range_leaves_list() {
        let mut items = images(2);
        let before = items.clone();
        assert_eq!(
            set_primary(&mut items, 5),
            Err(OrderingError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(items, before);
    }

    #[test]
    fn test_removing_sole_primary_promotes_next() {
        let mut items = images(3);
        let removed = remove(&mut items, 0).unwrap();

        assert!(removed.is_primary);
        assert_eq!(items.len(), 2);
        assert_eq!(orders(&items), vec![0, 1]);
        assert!(items[0].is_primary);
        assert!(!items[1].is_primary);
        assert_eq!(ids(&items), vec![2, 3]);
    }

    #[test]
    fn test_remove_keeps_orders_contiguous() {
        for index in 0..5 {
            let mut items = images(5);
            remove(&mut items, index).unwrap();
            assert_eq!(orders(&items), vec![0, 1, 2, 3]);
            assert!(is_normalized(&items));
        }
    }

    #[test]
    fn test_remove_last_item_empties_list() {
        let mut items = images(1);
        remove(&mut items, 0).unwrap();
        assert!(items.is_empty());
        assert!(is_normalized(&items));
    }

    #[test]
    fn test_reorder_moves_item_and_keeps_relative_order() {
        for from in 0..4 {
            for to in 0..4 {
                let mut items = images(4);
                let moved = items[from].id;
                reorder(&mut items, from, to).unwrap();

                assert_eq!(items[to].id, moved, "from {from} to {to}");
                let mut rest: Vec<i64> = ids(&items);
                rest.remove(to);
                let mut expected: Vec<i64> = vec![1, 2, 3, 4];
                expected.retain(|id| ImageKey::Persisted(ImageId::new(*id)) != moved);
                assert_eq!(rest, expected);
                assert!(items[0].is_primary, "position 0 primary after {from}->{to}");
                assert!(is_normalized(&items));
            }
        }
    }

    #[test]
    fn test_reorder_to_front_transfers_primary() {
        let mut items = images(3);
        reorder(&mut items, 2, 0).unwrap();
        assert_eq!(ids(&items), vec![3, 1, 2]);
        assert!(items[0].is_primary);
        assert!(!items[1].is_primary);
    }

    #[test]
    fn test_append_first_item_is_primary() {
        let mut items = Vec::new();
        append(&mut items, image(1, 9, false));
        append(&mut items, image(2, 9, true));
        assert_eq!(orders(&items), vec![0, 1]);
        assert!(items[0].is_primary);
        assert!(!items[1].is_primary);
    }

    #[test]
    fn test_normalize_repairs_server_data() {
        let mut items = vec![image(1, 5, false), image(2, 2, true), image(3, 0, false)];
        normalize(&mut items);
        assert_eq!(ids(&items), vec![2, 3, 1]);
        assert!(is_normalized(&items));
    }

    #[test]
    fn test_normalize_without_primary_flags_first() {
        let mut items = vec![image(1, 1, false), image(2, 0, false)];
        normalize(&mut items);
        assert_eq!(ids(&items), vec![2, 1]);
        assert!(items[0].is_primary);
    }
}
