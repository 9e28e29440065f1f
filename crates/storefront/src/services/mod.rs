//! Page composition services.
//!
//! - [`home`] - Concurrent product rows for the home page
//! - [`listing`] - Per-viewer request generations for listing filters

pub mod home;
pub mod listing;
