//! Session-held models for admin.

pub mod session;

pub use session::{CurrentAdmin, Flash, FlashKind, ProductDraft, keys as session_keys};
