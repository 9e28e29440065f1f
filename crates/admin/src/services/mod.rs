//! Business logic services for admin.
//!
//! - [`variant_images`] - Optimistic variant image editing with backend sync

pub mod variant_images;

pub use variant_images::{ImageCommand, SyncOutcome};
