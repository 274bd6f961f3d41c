//! Product matching heuristics.
//!
//! Given a free-text shopper question and a catalog snapshot, these functions
//! decide which products the question is about:
//!
//! - [`colors`] - derive a product's color values from options and variants
//! - [`relevance`] - score one product against a question
//! - [`select`] - rank a catalog and keep the best `k` products
//! - [`text`] - tokenization and text cleanup shared by the above
//!
//! The weights are tuning constants carried over unchanged from the first
//! deployed assistant; see [`relevance::weights`].

pub mod colors;
pub mod relevance;
pub mod select;
pub mod text;

pub use colors::extract_colors;
pub use relevance::{PriceRange, QueryTerms, ScoreBreakdown, score, score_breakdown};
pub use select::{DEFAULT_TOP_K, ScoredProduct, rank, top_k};
