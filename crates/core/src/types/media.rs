//! Image URL resolution.
//!
//! The backend returns image URLs either absolute or as object keys relative
//! to the storage bucket.

use super::catalog::Product;
use crate::ordering;

/// Normalize every variant's image list and resolve its URLs.
///
/// Applied to products as they arrive from the backend, so downstream code
/// can rely on one primary image at position 0 and contiguous orders.
pub fn prepare_images(product: &mut Product, storage_base: &str) {
    for variant in &mut product.variants {
        ordering::normalize(&mut variant.images);
        for image in &mut variant.images {
            image.url = resolve_image_url(storage_base, &image.url);
        }
    }
}

/// Resolve an image reference against the storage bucket base URL.
///
/// Absolute (`http://`, `https://`), protocol-relative (`//`) and inline
/// (`data:`, `blob:`) references are returned unchanged.
#[must_use]
pub fn resolve_image_url(storage_base: &str, reference: &str) -> String {
    let reference = reference.trim();
    let is_absolute = ["http://", "https://", "//", "data:", "blob:"]
        .iter()
        .any(|prefix| reference.starts_with(prefix));
    if is_absolute || reference.is_empty() {
        return reference.to_string();
    }
    format!(
        "{}/{}",
        storage_base.trim_end_matches('/'),
        reference.trim_start_matches('/')
    )
}
