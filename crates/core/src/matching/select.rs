//! Ranking a catalog and selecting the best matches.

use super::relevance::{QueryTerms, ScoreBreakdown, score_breakdown};
use crate::types::Product;

/// Default number of products passed on as context.
pub const DEFAULT_TOP_K: usize = 12;

/// A product paired with its score for one question.
#[derive(Debug, Clone, Copy)]
pub struct ScoredProduct<'a> {
    pub product: &'a Product,
    pub breakdown: ScoreBreakdown,
}

impl ScoredProduct<'_> {
    #[must_use]
    pub fn score(&self) -> f64 {
        self.breakdown.total()
    }
}

/// Score every product and sort by descending score.
///
/// The sort is stable: products with equal scores keep their catalog order.
#[must_use]
pub fn rank<'a>(query: &QueryTerms, products: &'a [Product]) -> Vec<ScoredProduct<'a>> {
    let mut scored: Vec<ScoredProduct<'a>> = products
        .iter()
        .map(|product| ScoredProduct {
            product,
            breakdown: score_breakdown(query, product),
        })
        .collect();
    scored.sort_by(|a, b| b.score().total_cmp(&a.score()));
    scored
}

/// The `k` highest-scoring products, best first.
#[must_use]
pub fn top_k<'a>(query: &QueryTerms, products: &'a [Product], k: usize) -> Vec<&'a Product> {
    rank(query, products)
        .into_iter()
        .take(k)
        .map(|scored| scored.product)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::matching::relevance::score;

    fn catalog() -> Vec<Product> {
        serde_json::from_str(
            r#"[
                {"id": 1, "title": "Gift Card", "variants": [{"id": 10, "price": "25.00"}]},
                {"id": 2, "title": "Leather Belt", "tags": "leather, accessories",
                 "variants": [{"id": 20, "price": "40.00"}]},
                {"id": 3, "title": "Canvas Belt", "variants": [{"id": 30, "price": "15.00"}]},
                {"id": 4, "title": "Wool Scarf", "variants": [{"id": 40, "price": "30.00"}]},
                {"id": 5, "title": "Braided Belt", "variants": [{"id": 50, "price": "20.00"}]}
            ]"#,
        )
        .unwrap()
    }

    fn ids(products: &[&Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn test_top_k_bounds_result() {
        let products = catalog();
        let query = QueryTerms::parse("belt");
        assert_eq!(top_k(&query, &products, 2).len(), 2);
        assert_eq!(top_k(&query, &products, 50).len(), products.len());
        assert!(top_k(&query, &products, 0).is_empty());
    }

    #[test]
    fn test_top_k_sorted_descending() {
        let products = catalog();
        let query = QueryTerms::parse("leather belt");
        let selected = top_k(&query, &products, DEFAULT_TOP_K);
        let scores: Vec<f64> = selected.iter().map(|p| score(&query, p)).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(selected[0].id.as_i64(), 2);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let products = catalog();
        let query = QueryTerms::parse("belt");
        // Three belts tie on the title match; the rest tie at zero.
        assert_eq!(ids(&top_k(&query, &products, 5)), [2, 3, 5, 1, 4]);
    }

    #[test]
    fn test_top_k_is_idempotent() {
        let products = catalog();
        let query = QueryTerms::parse("belt under 30");
        let first = ids(&top_k(&query, &products, 3));
        let second = ids(&top_k(&query, &products, 3));
        assert_eq!(first, second);
    }
}
