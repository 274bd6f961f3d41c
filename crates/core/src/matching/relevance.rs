//! Relevance scoring of one product against a shopper question.
//!
//! The score adds three signals:
//!
//! - keyword overlap between query tokens and product fields
//! - colors offered by the product that the question names
//! - whether the representative price satisfies a price range parsed from
//!   the question
//!
//! Higher is more relevant; the absolute value carries no meaning.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::colors::extract_colors;
use super::text::{clean_html, tokenize};
use crate::types::Product;

/// Scoring weights.
///
/// These are empirical tuning constants; change them only together with the
/// expected rankings in the tests.
pub mod weights {
    pub const TITLE: f64 = 5.0;
    pub const VENDOR: f64 = 2.0;
    pub const TAGS: f64 = 2.0;
    pub const PRODUCT_TYPE: f64 = 1.5;
    pub const BODY: f64 = 1.0;
    pub const COLOR: f64 = 6.0;
    pub const PRICE_IN_RANGE: f64 = 4.0;
    /// Subtracted once per violated bound.
    pub const PRICE_OUT_OF_RANGE: f64 = 2.0;
}

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("Invalid regex"));

/// Price bounds parsed from a question. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceRange {
    /// Parse a price range from every number in the question.
    ///
    /// One number is read as a maximum ("under 4000"); two or more give the
    /// smallest and largest as the bounds ("between 20 and 50"). No numbers
    /// means no range.
    #[must_use]
    pub fn parse(query: &str) -> Option<Self> {
        let numbers: Vec<Decimal> = NUMBER_RE
            .find_iter(query)
            .filter_map(|m| Decimal::from_str(&m.as_str().replace(',', "")).ok())
            .collect();

        match numbers.as_slice() {
            [] => None,
            [only] => Some(Self {
                min: None,
                max: Some(*only),
            }),
            many => Some(Self {
                min: many.iter().min().copied(),
                max: many.iter().max().copied(),
            }),
        }
    }

    /// Whether a price satisfies every bound.
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        self.violations(price) == 0
    }

    /// Number of bounds the price falls outside of.
    #[must_use]
    pub fn violations(&self, price: Decimal) -> u8 {
        let below = self.min.is_some_and(|min| price < min);
        let above = self.max.is_some_and(|max| price > max);
        u8::from(below) + u8::from(above)
    }
}

/// A question prepared for scoring against many products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerms {
    /// The whole question, lowercased.
    pub lower: String,
    /// Lowercase word tokens longer than two characters.
    pub tokens: Vec<String>,
    pub price_range: Option<PriceRange>,
}

impl QueryTerms {
    #[must_use]
    pub fn parse(query: &str) -> Self {
        Self {
            lower: query.to_lowercase(),
            tokens: tokenize(query),
            price_range: PriceRange::parse(query),
        }
    }
}

/// Per-signal contributions to a product's score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    /// Title, vendor, tags and product type matches.
    pub attributes: f64,
    /// Description matches.
    pub body: f64,
    pub color: f64,
    pub price: f64,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.attributes + self.body + self.color + self.price
    }

    /// Whether any token hit the title, vendor, tags or product type.
    #[must_use]
    pub fn matches_attributes(&self) -> bool {
        self.attributes > 0.0
    }
}

/// Score a product against a prepared question, signal by signal.
///
/// Tokens match as plain substrings of each field. Callers that want
/// plural questions to hit singular titles add those forms to
/// [`QueryTerms::tokens`] themselves.
#[must_use]
pub fn score_breakdown(query: &QueryTerms, product: &Product) -> ScoreBreakdown {
    let title = product.title.to_lowercase();
    let vendor = product.vendor.to_lowercase();
    let tags = product.tags.joined().to_lowercase();
    let product_type = product.product_type.to_lowercase();
    let body = clean_html(&product.body_html).to_lowercase();

    let mut breakdown = ScoreBreakdown::default();

    for token in &query.tokens {
        if title.contains(token.as_str()) {
            breakdown.attributes += weights::TITLE;
        }
        if vendor.contains(token.as_str()) {
            breakdown.attributes += weights::VENDOR;
        }
        if tags.contains(token.as_str()) {
            breakdown.attributes += weights::TAGS;
        }
        if product_type.contains(token.as_str()) {
            breakdown.attributes += weights::PRODUCT_TYPE;
        }
        if body.contains(token.as_str()) {
            breakdown.body += weights::BODY;
        }
    }

    for color in extract_colors(product) {
        if query.lower.contains(&color.to_lowercase()) {
            breakdown.color += weights::COLOR;
        }
    }

    if let (Some(range), Some(price)) = (query.price_range, product.price()) {
        breakdown.price = match range.violations(price) {
            0 => weights::PRICE_IN_RANGE,
            n => -weights::PRICE_OUT_OF_RANGE * f64::from(n),
        };
    }

    breakdown
}

/// Score a product against a prepared question.
#[must_use]
pub fn score(query: &QueryTerms, product: &Product) -> f64 {
    score_breakdown(query, product).total()
}
