//! Threadline Core - Shared types and catalog logic.
//!
//! This crate provides the pieces used by both Threadline binaries:
//! - `storefront` - Public-facing shop
//! - `admin` - Back-office for catalog and order management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Both binaries talk to the backend REST API themselves and hand
//! the decoded entities to the logic here.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, statuses and backend entities
//! - [`variants`] - Variant index, availability queries and selection reconciliation
//! - [`ordering`] - Primary flag and display order maintenance for variant images
//! - [`generation`] - Request generation tickets for discarding stale responses
//! - [`validation`] - Client-side validation errors and helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod generation;
pub mod ordering;
pub mod types;
pub mod validation;
pub mod variants;

#[cfg(test)]
mod fixtures;

pub use types::*;
pub use validation::ValidationError;
