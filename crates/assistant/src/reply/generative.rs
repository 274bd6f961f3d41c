//! Prompt construction and post-processing for generated replies.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use shop_assistant_core::{ChatMessage, ChatRole, Product};

use super::format::{FormatContext, context_entry};

/// Chat turns included in a prompt, most recent last.
pub const HISTORY_TURNS: usize = 6;

static MARKDOWN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\([^)]*\)").expect("Invalid regex"));

/// Build the generator prompt for one question.
///
/// `products` are the selected context products, best match first.
#[must_use]
pub fn build_prompt(
    store_name: &str,
    format: &FormatContext,
    products: &[&Product],
    history: &[ChatMessage],
    question: &str,
) -> String {
    let mut prompt = format!(
        "You are a friendly shopping assistant for {store_name}. Answer the customer's question \
         using only the product information below. Mention products by their exact title. \
         If the information needed is not listed, say so and suggest contacting the store.\n\n"
    );

    prompt.push_str("Products:\n");
    let entries: Vec<String> = products
        .iter()
        .enumerate()
        .map(|(i, product)| context_entry(format, i + 1, product))
        .collect();
    prompt.push_str(&entries.join("\n\n"));
    prompt.push_str("\n\n");

    let recent = history.iter().skip(history.len().saturating_sub(HISTORY_TURNS));
    let mut conversation = String::new();
    for message in recent {
        let speaker = match message.role {
            ChatRole::User => "Customer",
            ChatRole::Bot => "Assistant",
        };
        let _ = writeln!(conversation, "{speaker}: {}", message.text);
    }
    if !conversation.is_empty() {
        prompt.push_str("Conversation so far:\n");
        prompt.push_str(&conversation);
        prompt.push('\n');
    }

    let _ = write!(prompt, "Customer question: {}\n\nResponse:", question.trim());
    prompt
}

/// Turn product titles mentioned in `text` into markdown links.
///
/// Longer titles are matched first so "Complete Snowboard" wins over
/// "Snowboard". Matches must sit on word boundaries, and text already inside
/// a markdown link is left alone. Products without a URL are skipped.
#[must_use]
pub fn link_product_titles(text: &str, format: &FormatContext, products: &[Product]) -> String {
    let mut seen = HashSet::new();
    let mut titled: Vec<(&str, String)> = products
        .iter()
        .filter_map(|product| {
            let title = product.title.trim();
            if title.is_empty() || !seen.insert(title) {
                return None;
            }
            format.product_url(product).map(|url| (title, url))
        })
        .collect();
    titled.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut taken: Vec<Range<usize>> = MARKDOWN_LINK_RE
        .find_iter(text)
        .map(|m| m.range())
        .collect();
    let mut links: Vec<(Range<usize>, String)> = Vec::new();

    for (title, url) in titled {
        for (start, _) in text.match_indices(title) {
            let range = start..start + title.len();
            if !on_word_boundary(text, &range) || taken.iter().any(|t| overlaps(t, &range)) {
                continue;
            }
            taken.push(range.clone());
            links.push((range, format!("[{title}]({url})")));
        }
    }

    if links.is_empty() {
        return text.to_string();
    }
    links.sort_by_key(|(range, _)| range.start);

    let mut linked = String::with_capacity(text.len() + links.len() * 64);
    let mut cursor = 0;
    for (range, link) in links {
        linked.push_str(text.get(cursor..range.start).unwrap_or_default());
        linked.push_str(&link);
        cursor = range.end;
    }
    linked.push_str(text.get(cursor..).unwrap_or_default());
    linked
}

const fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn on_word_boundary(text: &str, range: &Range<usize>) -> bool {
    let before = text
        .get(..range.start)
        .and_then(|s| s.chars().next_back())
        .is_none_or(|c| !c.is_alphanumeric());
    let after = text
        .get(range.end..)
        .and_then(|s| s.chars().next())
        .is_none_or(|c| !c.is_alphanumeric());
    before && after
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shop_assistant_core::CurrencyCode;

    use super::*;

    fn format() -> FormatContext {
        FormatContext::new(
            CurrencyCode::USD,
            Some("https://starky-shop.myshopify.com".to_string()),
        )
    }

    fn products() -> Vec<Product> {
        serde_json::from_str(
            r#"[
                {"id": 1, "title": "Snowboard", "handle": "snowboard",
                 "body_html": "<p>A <b>basic</b> board.</p>",
                 "variants": [{"id": 10, "price": "300.00"}]},
                {"id": 2, "title": "Complete Snowboard", "handle": "complete-snowboard",
                 "variants": [{"id": 20, "price": "699.95"}]},
                {"id": 3, "title": "Mystery Box",
                 "variants": [{"id": 30, "price": "5.00"}]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_prompt_contains_context_and_question() {
        let products = products();
        let selected: Vec<&Product> = products.iter().collect();
        let prompt = build_prompt("Starky Shop", &format(), &selected, &[], " Any boards? ");

        assert!(prompt.starts_with("You are a friendly shopping assistant for Starky Shop."));
        assert!(prompt.contains("Product 1: Snowboard\n"));
        assert!(prompt.contains("Product 2: Complete Snowboard\n"));
        assert!(prompt.contains("Description: A basic board."));
        assert!(!prompt.contains("Conversation so far"));
        assert!(prompt.ends_with("Customer question: Any boards?\n\nResponse:"));
    }

    #[test]
    fn test_prompt_keeps_recent_turns_only() {
        let history: Vec<ChatMessage> = (1..=8)
            .map(|i| {
                if i % 2 == 1 {
                    ChatMessage::user(format!("question {i}"))
                } else {
                    ChatMessage::bot(format!("answer {i}"))
                }
            })
            .collect();
        let prompt = build_prompt("Starky Shop", &format(), &[], &history, "next");

        assert!(!prompt.contains("question 1"));
        assert!(!prompt.contains("answer 2"));
        assert!(prompt.contains("Customer: question 3\nAssistant: answer 4"));
        assert!(prompt.contains("Assistant: answer 8\n"));
    }

    #[test]
    fn test_longest_title_linked_first() {
        let linked = link_product_titles(
            "Try the Complete Snowboard or the Snowboard.",
            &format(),
            &products(),
        );
        assert_eq!(
            linked,
            "Try the [Complete Snowboard](https://starky-shop.myshopify.com/products/complete-snowboard) \
             or the [Snowboard](https://starky-shop.myshopify.com/products/snowboard)."
        );
    }

    #[test]
    fn test_existing_links_untouched() {
        let text = "See [Snowboard](https://example.com/x) today.";
        assert_eq!(link_product_titles(text, &format(), &products()), text);
    }

    #[test]
    fn test_titles_inside_words_and_without_url_are_skipped() {
        let text = "Snowboards and the Mystery Box.";
        assert_eq!(link_product_titles(text, &format(), &products()), text);
    }

    #[test]
    fn test_repeated_mentions_all_linked() {
        let linked = link_product_titles("Snowboard, Snowboard", &format(), &products());
        assert_eq!(linked.matches("](https://starky-shop.myshopify.com/products/snowboard)").count(), 2);
    }
}
