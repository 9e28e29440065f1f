//! Session-held models for the storefront.

pub mod session;

pub use session::{
    CartContext, CartLine, CustomerSession, Flash, FlashKind, keys as session_keys,
};
