//! Core types for Threadline.
//!
//! This module provides type-safe wrappers and the entities exchanged with
//! the backend API.

pub mod account;
pub mod catalog;
pub mod envelope;
pub mod id;
pub mod input;
pub mod media;
pub mod order;
pub mod price;
pub mod status;

pub use account::{AccountUser, AuthSession, LoginRequest};
pub use catalog::{
    Category, ColorOption, ImageKey, Product, ProductSummary, SizeOption, Variant, VariantImage,
};
pub use envelope::{Acknowledgement, Envelope, EnvelopeError, Paginated, Pagination};
pub use id::*;
pub use input::{ProductFields, ProductInput};
pub use media::{prepare_images, resolve_image_url};
pub use order::{
    CancelOrder, Order, OrderItem, PlaceOrder, PlaceOrderItem, ShippingAddress, Tracking,
    UpdateOrderStatus,
};
pub use price::{CurrencyCode, Price, PricePoint};
pub use status::*;
