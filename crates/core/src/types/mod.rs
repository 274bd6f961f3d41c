//! Core types for the shop assistant.
//!
//! This module provides type-safe wrappers for catalog and chat concepts.

pub mod chat;
pub mod id;
pub mod price;
pub mod product;
pub mod user_id;

pub use chat::{ChatMessage, ChatRole};
pub use id::*;
pub use price::{CurrencyCode, CurrencyCodeError, Price};
pub use product::{
    CollectionRef, DiscountRule, InventoryLevel, Product, ProductOption, StockLevel, Tags, Variant,
};
pub use user_id::{UserId, UserIdError};
