//! Shop Assistant Core - Catalog types and product matching.
//!
//! This crate provides the pieces shared by every Shop Assistant component:
//! - `shop-assistant` - HTTP chat service and catalog refresher
//! - `shop-assistant-cli` - Catalog sync and terminal chat
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks beyond timestamps carried in values. Everything here is
//! deterministic for a given catalog snapshot, which keeps the matching rules
//! easy to test.
//!
//! # Modules
//!
//! - [`types`] - Products, variants, chat messages, IDs and prices
//! - [`matching`] - Color extraction, relevance scoring and top-k selection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod matching;
pub mod types;

pub use types::*;
