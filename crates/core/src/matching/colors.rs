//! Color extraction from product options and variants.

use std::collections::BTreeSet;

use crate::types::Product;

/// Option names treated as the color option (compared case-insensitively).
const COLOR_OPTION_NAMES: &[&str] = &["color", "colour"];

/// Values that are never colors even when they appear in the color slot.
const PLACEHOLDER_VALUES: &[&str] = &["default", "title", "default title"];

/// Characters that mark a value as a price rather than a color.
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₽', '¢'];

/// Derive the set of color values offered for a product.
///
/// Values come from any option named "color"; products without such an
/// option fall back to each variant's first option value. Candidates that
/// contain a digit or a currency symbol, or that are placeholders such as
/// "Default Title", are dropped.
#[must_use]
pub fn extract_colors(product: &Product) -> BTreeSet<String> {
    let color_options: Vec<&String> = product
        .options
        .iter()
        .filter(|option| {
            COLOR_OPTION_NAMES
                .iter()
                .any(|name| option.name.trim().eq_ignore_ascii_case(name))
        })
        .flat_map(|option| option.values.iter())
        .collect();

    let candidates: Vec<&String> = if color_options.is_empty() {
        product
            .variants
            .iter()
            .filter_map(|variant| variant.option1.as_ref())
            .collect()
    } else {
        color_options
    };

    candidates
        .into_iter()
        .map(|value| value.trim())
        .filter(|value| is_color_value(value))
        .map(str::to_string)
        .collect()
}

/// Whether a trimmed candidate can be shown to shoppers as a color.
fn is_color_value(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if value
        .chars()
        .any(|c| c.is_numeric() || CURRENCY_SYMBOLS.contains(&c))
    {
        return false;
    }
    !PLACEHOLDER_VALUES
        .iter()
        .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(json: &str) -> Product {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_colors_from_color_option() {
        let p = product(
            r#"{"id": 1, "title": "Belt",
                "options": [{"name": "Size", "values": ["S", "M"]},
                            {"name": "COLOR", "values": ["Black", " Brown ", "Black"]}],
                "variants": [{"id": 10, "option1": "S"}]}"#,
        );
        let colors: Vec<String> = extract_colors(&p).into_iter().collect();
        assert_eq!(colors, ["Black", "Brown"]);
    }

    #[test]
    fn test_colors_fall_back_to_variant_option1() {
        let p = product(
            r#"{"id": 1, "title": "Scarf",
                "options": [{"name": "Title", "values": ["Default Title"]}],
                "variants": [{"id": 10, "option1": "Red"},
                             {"id": 11, "option1": "Default Title"},
                             {"id": 12, "option1": "Navy"}]}"#,
        );
        let colors: Vec<String> = extract_colors(&p).into_iter().collect();
        assert_eq!(colors, ["Navy", "Red"]);
    }

    #[test]
    fn test_colors_filter_prices_digits_and_placeholders() {
        let p = product(
            r#"{"id": 1, "title": "Card",
                "options": [{"name": "Color",
                             "values": ["$10", "₹500", "Size 32", "default", "Title", "  ", "Teal"]}]}"#,
        );
        let colors: Vec<String> = extract_colors(&p).into_iter().collect();
        assert_eq!(colors, ["Teal"]);
    }

    #[test]
    fn test_colors_never_contain_digits_or_currency() {
        let p = product(
            r#"{"id": 1, "title": "Mixed",
                "variants": [{"id": 1, "option1": "10.00"}, {"id": 2, "option1": "€ Blue"},
                             {"id": 3, "option1": "Green2"}, {"id": 4, "option1": "Olive"}]}"#,
        );
        for color in extract_colors(&p) {
            assert!(!color.chars().any(char::is_numeric));
            assert!(!color.chars().any(|c| CURRENCY_SYMBOLS.contains(&c)));
        }
        assert_eq!(extract_colors(&p).len(), 1);
    }

    #[test]
    fn test_no_options_no_variants() {
        let p = product(r#"{"id": 1, "title": "Gift Card"}"#);
        assert!(extract_colors(&p).is_empty());
    }
}
