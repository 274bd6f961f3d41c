//! Keyword rules for canned replies.
//!
//! [`RULES`] is an ordered table; the first rule whose predicate accepts the
//! question produces the reply. Rules that read product data answer with
//! [`NO_DATA_MESSAGE`] while the catalog is empty. The last rule always
//! applies.

use std::collections::{BTreeMap, BTreeSet};

use shop_assistant_core::matching::text::{contains_phrase, token_variants};
use shop_assistant_core::matching::{QueryTerms, extract_colors, rank};
use shop_assistant_core::{Price, Product};

use super::NO_DATA_MESSAGE;
use super::format::{FormatContext, link_lines, price_lines, product_cards, stock_text};

/// Cards shown for an explicit product lookup.
const MAX_CARDS: usize = 5;
/// Cards shown when nothing more specific matched.
const FALLBACK_CARDS: usize = 3;
/// Greetings longer than this are treated as questions.
const MAX_GREETING_WORDS: usize = 4;

/// Question words that never identify a product.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "you", "your", "are", "was", "what", "which", "does", "did", "have",
    "has", "with", "can", "any", "anything", "how", "much", "show", "tell", "about", "there",
    "this", "that", "from", "come", "some", "get", "want", "need", "please", "all", "our",
    "who", "where", "when", "its", "them", "they", "under", "over", "between", "less", "than",
    "more", "price", "prices", "cost", "color", "colors", "colour", "colours", "sale", "buy",
    "products", "product", "items", "item", "store", "carry", "brand", "brands", "link", "links",
    "stock", "availability", "arrivals", "arrival", "latest", "newest",
];

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "hiya", "howdy", "greetings", "namaste"];
const GREETING_PHRASES: &[&str] = &["good morning", "good afternoon", "good evening"];
const COLOR_WORDS: &[&str] = &["color", "colors", "colour", "colours", "shade", "shades"];
const SHOW_ALL_PHRASES: &[&str] = &[
    "show all",
    "all products",
    "all items",
    "list products",
    "list all",
    "list your products",
    "full catalog",
    "entire catalog",
    "everything you have",
    "what do you have",
    "what do you sell",
    "what products",
];
const PRICE_WORDS: &[&str] = &[
    "price", "prices", "priced", "pricing", "cost", "costs", "cheap", "cheaper", "cheapest",
    "expensive", "budget", "under", "below", "between",
];
const PRICE_PHRASES: &[&str] = &["how much", "less than"];
const DISCOUNT_WORDS: &[&str] = &[
    "sale", "sales", "discount", "discounts", "discounted", "promotion", "promotions", "promo",
    "promos", "clearance", "markdown", "markdowns", "coupon", "coupons",
];
/// "offer" and "deal" alone are too common ("do you offer returns?").
const DISCOUNT_PHRASES: &[&str] = &[
    "on sale",
    "special offer",
    "special offers",
    "any offers",
    "current offers",
    "any deals",
    "best deals",
    "good deals",
    "great deals",
];
const DISCOUNT_TAGS: &[&str] = &["sale", "discount"];
const VENDOR_WORDS: &[&str] = &["vendor", "vendors", "brand", "brands", "maker", "manufacturer"];
const TAG_WORDS: &[&str] = &["tag", "tags", "tagged"];
const CATEGORY_WORDS: &[&str] = &["category", "categories"];
const DETAIL_WORDS: &[&str] = &["details", "detail", "describe", "specs"];
const BUY_WORDS: &[&str] = &["buy", "purchase", "link", "links", "url", "checkout"];
const BUY_PHRASES: &[&str] = &["where can i get", "how do i order", "how to order"];
const SHIPPING_WORDS: &[&str] = &[
    "shipping", "ship", "ships", "shipped", "delivery", "deliver", "delivered", "courier",
];
const NEW_ARRIVAL_PHRASES: &[&str] = &[
    "new arrival",
    "new arrivals",
    "what's new",
    "whats new",
    "what is new",
    "just arrived",
    "latest",
    "newest",
];
const NEW_ARRIVAL_TAGS: &[&str] = &["new", "latest"];
const STOCK_WORDS: &[&str] = &["stock", "instock", "inventory", "availability", "restock", "restocked"];
const STOCK_PHRASES: &[&str] = &["sold out", "in stock", "out of stock"];
const INTERNATIONAL_WORDS: &[&str] = &["international", "internationally", "abroad", "overseas", "worldwide"];

const NO_SALE_MESSAGE: &str =
    "Currently, there are no products on sale. Please check back soon for discounts!";
const DOMESTIC_SHIPPING_MESSAGE: &str = "Estimated delivery time is 3-7 business days for domestic orders and 7-15 business days for international orders. Shipping options and fees are shown at checkout.";
const INTERNATIONAL_SHIPPING_MESSAGE: &str = "Yes, we offer international shipping to many countries. Shipping fees and delivery times vary by location. You'll see available options at checkout.";
const TRACK_ORDER_MESSAGE: &str = "To track your order, log in to your account and go to 'My Orders'. You'll find real-time updates and tracking information there. If you need help, contact our customer service.";
const CANCEL_ORDER_MESSAGE: &str = "You can cancel your order within 1 hour of placing it, as long as it hasn't been processed for shipping. Please contact customer service immediately for assistance.";
const RETURN_POLICY_MESSAGE: &str = "You can return most products within 30 days of delivery for a full refund or exchange. Please make sure the product is unused and in its original packaging.";
const EXCHANGE_MESSAGE: &str = "Yes, you can exchange most products within 30 days of delivery, provided they are unused and in their original packaging.";
const PAYMENT_MESSAGE: &str = "We accept credit and debit cards along with popular wallets. All available payment options are shown at checkout.";
const NEW_ARRIVALS_MESSAGE: &str = "We update our collection regularly. Check the 'New Arrivals' section on our website for the latest products!";
const STOCK_MESSAGE: &str = "Product availability is shown on each product page. If an item is out of stock, you'll see an 'Out of Stock' label.";
const FIRST_PURCHASE_MESSAGE: &str = "Yes! Use code WELCOME10 at checkout to get 10% off your first purchase.";
const APPLY_COUPON_MESSAGE: &str = "You can enter your coupon code during checkout in the 'Apply Coupon' field. The discount will be applied to your order total.";
const CHANGE_ADDRESS_MESSAGE: &str = "If your order hasn't shipped yet, you can change your delivery address by contacting customer service as soon as possible.";
const ACCOUNT_BENEFITS_MESSAGE: &str = "Creating an account lets you track orders, save addresses, earn loyalty points, and get exclusive offers and faster checkout.";
const CREATE_ACCOUNT_MESSAGE: &str = "Click on the 'Sign Up' or 'Create Account' button at the top right of our website and fill in your details to register.";
const TAX_MESSAGE: &str = "Yes, all prices displayed on our website are inclusive of applicable taxes unless stated otherwise at checkout.";
const ADD_TO_CART_MESSAGE: &str = "To add items to your cart, simply click the 'Add to Cart' button on the product page.";
const WARRANTY_MESSAGE: &str = "Many of our products come with a manufacturer's warranty. Please check the product page for specific warranty details.";
const PRE_ORDER_MESSAGE: &str = "Pre-order is available for select products. If a product is out of stock but available for pre-order, you'll see a 'Pre-order' button on the product page.";
const GIFT_WRAP_MESSAGE: &str = "Yes, we offer gift wrapping services for a small additional fee. You can select this option during checkout.";
const LOYALTY_MESSAGE: &str = "Log in to your account to view your loyalty points. You can redeem them for discounts at checkout.";
const SIZE_MESSAGE: &str = "We offer a wide range of sizes for our clothing products. Please refer to the size chart on each product page for details.";
const REFUND_STATUS_MESSAGE: &str = "To check your refund status, log in to your account and go to 'My Orders'. Refund updates will also be sent to your registered email.";
const CONTACT_MESSAGE: &str = "You can contact our customer service via the chat on our website, by email, or by phone. We're here to help 24/7!";
const CARE_MESSAGE: &str = "Care instructions are provided on each product page. For most items, keep them clean, dry, and store them properly to ensure longevity.";
const BUNDLE_MESSAGE: &str = "Yes, we offer product bundles and packages at discounted rates. Check our 'Bundles' section for current offers.";
const REVIEW_MESSAGE: &str = "Absolutely! After your purchase, you'll receive an email with a link to leave a review. You can also review products directly on their product pages.";
const DAMAGED_ITEM_MESSAGE: &str = "We're sorry for the inconvenience. Please contact customer service immediately with your order details and photos, and we'll resolve the issue promptly.";

/// A shopper question prepared for rule matching.
#[derive(Debug, Clone)]
pub struct Inquiry {
    /// Lowercased question.
    pub lower: String,
    /// Every lowercase word, including short ones such as "hi".
    pub words: Vec<String>,
    /// Scoring input for the matcher, without question words.
    pub terms: QueryTerms,
}

impl Inquiry {
    #[must_use]
    pub fn new(question: &str) -> Self {
        let lower = question.trim().to_lowercase();
        let words = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let mut terms = QueryTerms::parse(question);
        let mut tokens: Vec<String> = Vec::with_capacity(terms.tokens.len());
        for token in &terms.tokens {
            if STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            // The shortest singular form is a substring of the plural, so it
            // matches both "belt" and "belts"
            let stem = token_variants(token)
                .min_by_key(|v| v.len())
                .unwrap_or(token.as_str())
                .to_string();
            if !tokens.contains(&stem) {
                tokens.push(stem);
            }
        }
        terms.tokens = tokens;
        Self {
            words,
            terms,
            lower,
        }
    }

    fn has_any_word(&self, candidates: &[&str]) -> bool {
        self.words.iter().any(|w| candidates.contains(&w.as_str()))
    }

    fn has_any_phrase(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| contains_phrase(&self.lower, p))
    }
}

/// What the rules can see of the store.
#[derive(Debug, Clone, Copy)]
pub struct Shop<'a> {
    pub products: &'a [Product],
    pub format: &'a FormatContext,
    pub store_name: &'a str,
}

type Predicate = fn(&Inquiry, &Shop<'_>) -> bool;
type Handler = fn(&Inquiry, &Shop<'_>) -> String;

/// One entry of the dispatch table.
pub struct Rule {
    pub name: &'static str,
    /// Answer with the no-data message instead when the catalog is empty.
    pub needs_catalog: bool,
    pub applies: Predicate,
    pub respond: Handler,
}

/// A canned reply and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub rule: &'static str,
    pub text: String,
}

/// Dispatch order; the first applicable rule wins.
pub static RULES: &[Rule] = &[
    Rule {
        name: "greeting",
        needs_catalog: false,
        applies: is_greeting,
        respond: greet,
    },
    Rule {
        name: "store_policy",
        needs_catalog: false,
        applies: is_policy_question,
        respond: policy_answer,
    },
    Rule {
        name: "color_clarification",
        needs_catalog: true,
        applies: is_ambiguous_color_question,
        respond: clarify_colors,
    },
    Rule {
        name: "color",
        needs_catalog: true,
        applies: names_catalog_color,
        respond: products_in_color,
    },
    Rule {
        name: "show_all",
        needs_catalog: true,
        applies: is_show_all,
        respond: list_catalog,
    },
    Rule {
        name: "new_arrivals",
        needs_catalog: true,
        applies: is_new_arrivals_question,
        respond: new_arrivals,
    },
    Rule {
        name: "stock",
        needs_catalog: true,
        applies: is_stock_question,
        respond: stock,
    },
    Rule {
        name: "price",
        needs_catalog: true,
        applies: is_price_question,
        respond: prices,
    },
    Rule {
        name: "discount",
        needs_catalog: true,
        applies: is_discount_question,
        respond: discounted_products,
    },
    Rule {
        name: "product_details",
        needs_catalog: true,
        applies: is_detail_question,
        respond: product_details,
    },
    Rule {
        name: "buy_link",
        needs_catalog: true,
        applies: is_buy_question,
        respond: buy_links,
    },
    Rule {
        name: "shipping",
        needs_catalog: false,
        applies: is_shipping_question,
        respond: shipping,
    },
    Rule {
        name: "fallback",
        needs_catalog: false,
        applies: always,
        respond: best_matches,
    },
];

/// Produce a canned reply.
#[must_use]
pub fn route(inquiry: &Inquiry, shop: &Shop<'_>) -> Routed {
    for rule in RULES {
        if (rule.applies)(inquiry, shop) {
            let text = if rule.needs_catalog && shop.products.is_empty() {
                NO_DATA_MESSAGE.to_string()
            } else {
                (rule.respond)(inquiry, shop)
            };
            return Routed {
                rule: rule.name,
                text,
            };
        }
    }
    // The table ends with an unconditional rule.
    Routed {
        rule: "fallback",
        text: help_message(shop.store_name),
    }
}

/// Generic help text.
#[must_use]
pub fn help_message(store_name: &str) -> String {
    format!(
        "I'm the {store_name} shopping assistant. Ask me about products, prices, colors and discounts, \
         or about shipping and returns. What are you looking for?"
    )
}

// =============================================================================
// Matching helpers
// =============================================================================

/// Products whose title, vendor, tags or type match a query token, best first.
fn attribute_matches<'a>(inquiry: &Inquiry, products: &'a [Product]) -> Vec<&'a Product> {
    rank(&inquiry.terms, products)
        .into_iter()
        .filter(|scored| scored.breakdown.matches_attributes())
        .map(|scored| scored.product)
        .collect()
}

/// Products whose full title appears in the question.
fn mentioned_products<'a>(inquiry: &Inquiry, products: &'a [Product]) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| {
            let title = p.title.trim().to_lowercase();
            !title.is_empty() && contains_phrase(&inquiry.lower, &title)
        })
        .collect()
}

/// Catalog colors named in the question, keyed by lowercase value.
fn named_colors(inquiry: &Inquiry, products: &[Product]) -> BTreeMap<String, String> {
    products
        .iter()
        .flat_map(extract_colors)
        .filter(|color| contains_phrase(&inquiry.lower, &color.to_lowercase()))
        .map(|color| (color.to_lowercase(), color))
        .collect()
}

fn offers_any_color(product: &Product, colors: &BTreeMap<String, String>) -> bool {
    extract_colors(product)
        .iter()
        .any(|color| colors.contains_key(&color.to_lowercase()))
}

fn titles(products: &[&Product], limit: usize) -> String {
    products
        .iter()
        .take(limit)
        .map(|p| p.title.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Rules
// =============================================================================

fn is_greeting(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    inquiry.words.len() <= MAX_GREETING_WORDS
        && (inquiry.has_any_word(GREETING_WORDS) || inquiry.has_any_phrase(GREETING_PHRASES))
}

fn greet(_inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    format!(
        "Hello! 👋 Welcome to {}! I'm your shopping assistant. \
         Ask me about our products, prices, colors or current discounts.",
        shop.store_name
    )
}

fn is_ambiguous_color_question(inquiry: &Inquiry, shop: &Shop<'_>) -> bool {
    inquiry.has_any_word(COLOR_WORDS) && named_colors(inquiry, shop.products).is_empty()
}

fn clarify_colors(inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let matches = attribute_matches(inquiry, shop.products);
    match matches.as_slice() {
        [product] => {
            let colors = extract_colors(product);
            if colors.is_empty() {
                format!("{} doesn't come in different color options.", product.title)
            } else {
                format!(
                    "{} is available in: {}",
                    product.title,
                    colors.into_iter().collect::<Vec<_>>().join(", ")
                )
            }
        }
        [] => "Which product would you like to know the colors of? \
               Tell me the product name and I'll list the available colors."
            .to_string(),
        several => format!(
            "Which product do you mean? I found: {}. Tell me the product name and I'll list its colors.",
            titles(several, MAX_CARDS)
        ),
    }
}

fn names_catalog_color(inquiry: &Inquiry, shop: &Shop<'_>) -> bool {
    !named_colors(inquiry, shop.products).is_empty()
}

fn products_in_color(inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let colors = named_colors(inquiry, shop.products);
    let in_color: Vec<&Product> = rank(&inquiry.terms, shop.products)
        .into_iter()
        .map(|scored| scored.product)
        .filter(|p| offers_any_color(p, &colors))
        .collect();

    // Narrow to products the question also names, when there are any.
    let named = attribute_matches(inquiry, shop.products);
    let narrowed: Vec<&Product> = in_color
        .iter()
        .copied()
        .filter(|p| named.iter().any(|n| n.id == p.id))
        .collect();
    let selected = if narrowed.is_empty() { in_color } else { narrowed };

    let color_names = colors.into_values().collect::<Vec<_>>().join(" / ");
    format!(
        "Here's what we have in {color_names}:\n\n{}",
        product_cards(shop.format, selected.into_iter().take(MAX_CARDS))
    )
}

fn is_show_all(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    inquiry.has_any_phrase(SHOW_ALL_PHRASES)
}

fn list_catalog(_inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let lines: Vec<String> = shop
        .products
        .iter()
        .enumerate()
        .map(|(i, p)| match shop.format.price(p) {
            Some(price) => format!("{}. {} - {price}", i + 1, p.title),
            None => format!("{}. {}", i + 1, p.title),
        })
        .collect();
    format!(
        "Here is everything in our catalog ({} products):\n{}",
        shop.products.len(),
        lines.join("\n")
    )
}

fn is_new_arrivals_question(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    inquiry.has_any_phrase(NEW_ARRIVAL_PHRASES)
}

fn new_arrivals(_inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let fresh: Vec<&Product> = shop
        .products
        .iter()
        .filter(|p| NEW_ARRIVAL_TAGS.iter().any(|tag| p.tags.contains(tag)))
        .collect();
    if fresh.is_empty() {
        NEW_ARRIVALS_MESSAGE.to_string()
    } else {
        format!(
            "Here are our latest arrivals:\n{}",
            price_lines(shop.format, fresh)
        )
    }
}

fn is_stock_question(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    inquiry.has_any_word(STOCK_WORDS) || inquiry.has_any_phrase(STOCK_PHRASES)
}

/// Stock for the products the question names; the generic answer when it
/// names none or none of them track inventory.
fn stock(inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let mut named = mentioned_products(inquiry, shop.products);
    if named.is_empty() {
        named = attribute_matches(inquiry, shop.products);
    }
    let lines: Vec<String> = named
        .into_iter()
        .take(MAX_CARDS)
        .filter_map(|p| stock_text(p).map(|text| format!("- {}: {text}", p.title)))
        .collect();
    if lines.is_empty() {
        STOCK_MESSAGE.to_string()
    } else {
        format!("Current availability:\n{}", lines.join("\n"))
    }
}

fn is_price_question(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    inquiry.has_any_word(PRICE_WORDS) || inquiry.has_any_phrase(PRICE_PHRASES)
}

fn prices(inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let matches = attribute_matches(inquiry, shop.products);

    let Some(range) = inquiry.terms.price_range else {
        return if matches.is_empty() {
            format!(
                "Here are our current prices:\n{}",
                price_lines(shop.format, shop.products)
            )
        } else {
            format!("Here are the prices:\n{}", price_lines(shop.format, matches))
        };
    };

    let pool: Vec<&Product> = if matches.is_empty() {
        shop.products.iter().collect()
    } else {
        matches
    };
    let in_range: Vec<&Product> = pool
        .into_iter()
        .filter(|p| p.price().is_some_and(|price| range.contains(price)))
        .collect();

    let currency = shop.format.currency;
    let bound = |amount| Price::new(amount, currency).to_string();
    let described = match (range.min, range.max) {
        (Some(min), Some(max)) => format!("between {} and {}", bound(min), bound(max)),
        (None, Some(max)) => format!("under {}", bound(max)),
        (Some(min), None) => format!("over {}", bound(min)),
        (None, None) => "in that range".to_string(),
    };

    if in_range.is_empty() {
        format!("No products found {described}.")
    } else {
        format!(
            "Products {described}:\n{}",
            price_lines(shop.format, in_range)
        )
    }
}

fn is_discount_question(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    inquiry.has_any_word(DISCOUNT_WORDS) || inquiry.has_any_phrase(DISCOUNT_PHRASES)
}

/// Products marked down, tagged for sale, or covered by a running price rule.
fn discounted_products(_inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let ctx = shop.format;
    let lines: Vec<String> = shop
        .products
        .iter()
        .filter_map(|p| {
            let offers = ctx.offers(p);
            let marked = p.is_discounted() || DISCOUNT_TAGS.iter().any(|tag| p.tags.contains(tag));
            let price = ctx.price_with_discount(p);
            match offers {
                Some(offers) => Some(format!("- {}: {price} | Offers: {offers}", p.title)),
                None if marked => Some(format!("- {}: {price}", p.title)),
                None => None,
            }
        })
        .collect();
    if lines.is_empty() {
        NO_SALE_MESSAGE.to_string()
    } else {
        format!("Products currently on sale:\n{}", lines.join("\n"))
    }
}

fn is_detail_question(inquiry: &Inquiry, shop: &Shop<'_>) -> bool {
    inquiry.has_any_word(VENDOR_WORDS)
        || inquiry.has_any_word(TAG_WORDS)
        || inquiry.has_any_word(CATEGORY_WORDS)
        || inquiry.has_any_word(DETAIL_WORDS)
        || !mentioned_products(inquiry, shop.products).is_empty()
}

fn product_details(inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let mentioned = mentioned_products(inquiry, shop.products);
    let matches = if mentioned.is_empty() {
        attribute_matches(inquiry, shop.products)
    } else {
        mentioned
    };
    if !matches.is_empty() {
        return product_cards(shop.format, matches.into_iter().take(MAX_CARDS));
    }

    let distinct = |values: Vec<&str>| -> String {
        values
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>()
            .join(", ")
    };

    if inquiry.has_any_word(VENDOR_WORDS) {
        let vendors = distinct(shop.products.iter().map(|p| p.vendor.as_str()).collect());
        return format!("We carry products from: {vendors}");
    }
    if inquiry.has_any_word(TAG_WORDS) {
        let tags = distinct(
            shop.products
                .iter()
                .flat_map(|p| p.tags.as_slice())
                .map(String::as_str)
                .collect(),
        );
        return format!("Products are tagged with: {tags}");
    }
    if inquiry.has_any_word(CATEGORY_WORDS) {
        let categories = distinct(shop.products.iter().map(|p| p.product_type.as_str()).collect());
        return format!("Our categories: {categories}");
    }
    "I couldn't find a product matching that. Try the product name or brand.".to_string()
}

fn is_buy_question(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    inquiry.has_any_word(BUY_WORDS) || inquiry.has_any_phrase(BUY_PHRASES)
}

fn buy_links(inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    let mut candidates = mentioned_products(inquiry, shop.products);
    if candidates.is_empty() {
        candidates = attribute_matches(inquiry, shop.products);
    }
    if candidates.is_empty() {
        candidates = shop.products.iter().collect();
    }

    let links = link_lines(shop.format, candidates);
    if links.is_empty() {
        "Product links aren't available right now. Please visit our store to shop.".to_string()
    } else {
        format!("You can buy here:\n{links}")
    }
}

fn is_shipping_question(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    inquiry.has_any_word(SHIPPING_WORDS)
}

fn shipping(inquiry: &Inquiry, _shop: &Shop<'_>) -> String {
    if inquiry.has_any_word(INTERNATIONAL_WORDS) {
        INTERNATIONAL_SHIPPING_MESSAGE.to_string()
    } else {
        DOMESTIC_SHIPPING_MESSAGE.to_string()
    }
}

fn asks_tracking(q: &Inquiry) -> bool {
    q.has_any_word(&["track", "tracking"]) && q.has_any_word(&["order", "orders", "package", "parcel"])
}

fn asks_refund_status(q: &Inquiry) -> bool {
    q.has_any_word(&["refund", "refunds"])
        && (q.has_any_word(&["status", "received", "yet"]) || q.has_any_phrase(&["where is my"]))
}

fn asks_cancellation(q: &Inquiry) -> bool {
    q.has_any_word(&["cancel", "cancellation"]) && q.has_any_word(&["order", "orders"])
}

fn asks_address_change(q: &Inquiry) -> bool {
    q.has_any_word(&["change", "update", "edit", "wrong"]) && q.has_any_word(&["address"])
}

fn asks_damaged_item(q: &Inquiry) -> bool {
    q.has_any_word(&["damaged", "broken", "defective"])
        || (q.has_any_word(&["wrong", "incorrect"])
            && q.has_any_word(&["item", "items", "product", "order", "size", "color"]))
}

fn asks_returns(q: &Inquiry) -> bool {
    q.has_any_phrase(&["return policy"]) || q.has_any_word(&["return", "returns", "refund", "refunds"])
}

fn asks_exchange(q: &Inquiry) -> bool {
    q.has_any_word(&["exchange", "exchanges"])
}

fn asks_payment(q: &Inquiry) -> bool {
    q.has_any_word(&["payment", "payments"])
        || q.has_any_phrase(&["how can i pay", "how do i pay", "pay with", "pay by", "pay using"])
}

fn asks_first_purchase(q: &Inquiry) -> bool {
    q.has_any_phrase(&["first purchase", "first order", "first time buyer", "first time customer"])
}

fn asks_coupon_use(q: &Inquiry) -> bool {
    (q.has_any_word(&["coupon", "coupons", "voucher"]) || q.has_any_phrase(&["promo code", "discount code"]))
        && q.has_any_word(&["apply", "use", "enter", "redeem", "where"])
}

fn asks_account_benefits(q: &Inquiry) -> bool {
    q.has_any_word(&["account"])
        && q.has_any_word(&["benefit", "benefits", "why", "advantage", "advantages", "perks"])
}

fn asks_account_creation(q: &Inquiry) -> bool {
    q.has_any_phrase(&["create an account", "create account", "sign up", "signup", "open an account"])
        || q.has_any_word(&["register", "registration"])
}

fn asks_tax(q: &Inquiry) -> bool {
    q.has_any_word(&["tax", "taxes", "vat", "gst"])
}

fn asks_add_to_cart(q: &Inquiry) -> bool {
    q.has_any_word(&["cart", "basket"]) && q.has_any_word(&["add", "adding", "put"])
}

fn asks_warranty(q: &Inquiry) -> bool {
    q.has_any_word(&["warranty", "warranties", "guarantee"])
}

fn asks_pre_order(q: &Inquiry) -> bool {
    q.has_any_phrase(&["pre-order", "pre order"]) || q.has_any_word(&["preorder", "preorders"])
}

fn asks_gift_wrap(q: &Inquiry) -> bool {
    q.has_any_phrase(&["gift wrap", "gift wrapping", "gift wrapped"]) || q.has_any_word(&["giftwrap"])
}

fn asks_loyalty(q: &Inquiry) -> bool {
    q.has_any_word(&["loyalty"]) || q.has_any_phrase(&["reward points", "my points"])
}

fn asks_sizes(q: &Inquiry) -> bool {
    q.has_any_phrase(&["size chart", "size guide"])
        || (q.has_any_word(&["size", "sizes", "sizing"])
            && q.has_any_word(&["clothing", "clothes", "apparel", "fit"]))
}

fn asks_contact(q: &Inquiry) -> bool {
    q.has_any_phrase(&["customer service", "customer support", "customer care", "contact you", "contact us"])
        || q.has_any_word(&["contact"])
}

fn asks_care(q: &Inquiry) -> bool {
    q.has_any_phrase(&[
        "care instructions",
        "how do i care",
        "how to care",
        "how do i clean",
        "how to clean",
        "how do i wash",
        "how to wash",
    ])
}

fn asks_bundles(q: &Inquiry) -> bool {
    q.has_any_word(&["bundle", "bundles"])
}

fn asks_reviews(q: &Inquiry) -> bool {
    q.has_any_word(&["review", "reviews"])
}

/// Store policy questions, checked in order.
///
/// More specific questions come first: a refund status question also
/// mentions refunds, a damaged item question may also ask for a return.
static POLICY_ANSWERS: &[(fn(&Inquiry) -> bool, &str)] = &[
    (asks_tracking, TRACK_ORDER_MESSAGE),
    (asks_refund_status, REFUND_STATUS_MESSAGE),
    (asks_cancellation, CANCEL_ORDER_MESSAGE),
    (asks_address_change, CHANGE_ADDRESS_MESSAGE),
    (asks_damaged_item, DAMAGED_ITEM_MESSAGE),
    (asks_returns, RETURN_POLICY_MESSAGE),
    (asks_exchange, EXCHANGE_MESSAGE),
    (asks_payment, PAYMENT_MESSAGE),
    (asks_first_purchase, FIRST_PURCHASE_MESSAGE),
    (asks_coupon_use, APPLY_COUPON_MESSAGE),
    (asks_account_benefits, ACCOUNT_BENEFITS_MESSAGE),
    (asks_account_creation, CREATE_ACCOUNT_MESSAGE),
    (asks_tax, TAX_MESSAGE),
    (asks_add_to_cart, ADD_TO_CART_MESSAGE),
    (asks_warranty, WARRANTY_MESSAGE),
    (asks_pre_order, PRE_ORDER_MESSAGE),
    (asks_gift_wrap, GIFT_WRAP_MESSAGE),
    (asks_loyalty, LOYALTY_MESSAGE),
    (asks_sizes, SIZE_MESSAGE),
    (asks_care, CARE_MESSAGE),
    (asks_bundles, BUNDLE_MESSAGE),
    (asks_reviews, REVIEW_MESSAGE),
    (asks_contact, CONTACT_MESSAGE),
];

fn is_policy_question(inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    POLICY_ANSWERS.iter().any(|(matches, _)| matches(inquiry))
}

fn policy_answer(inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    POLICY_ANSWERS
        .iter()
        .find(|(matches, _)| matches(inquiry))
        .map_or_else(|| help_message(shop.store_name), |(_, answer)| (*answer).to_string())
}

const fn always(_inquiry: &Inquiry, _shop: &Shop<'_>) -> bool {
    true
}

fn best_matches(inquiry: &Inquiry, shop: &Shop<'_>) -> String {
    if shop.products.is_empty() {
        return NO_DATA_MESSAGE.to_string();
    }

    let ranked = rank(&inquiry.terms, shop.products);
    let on_attributes: Vec<&Product> = ranked
        .iter()
        .filter(|s| s.breakdown.matches_attributes())
        .map(|s| s.product)
        .collect();
    let selected = if on_attributes.is_empty() {
        ranked
            .iter()
            .filter(|s| s.score() > 0.0)
            .map(|s| s.product)
            .collect()
    } else {
        on_attributes
    };

    if selected.is_empty() {
        help_message(shop.store_name)
    } else {
        format!(
            "Here's what I found:\n\n{}",
            product_cards(shop.format, selected.into_iter().take(FALLBACK_CARDS))
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shop_assistant_core::CurrencyCode;

    use super::*;

    const STORE: &str = "Starky Shop";

    fn catalog() -> Vec<Product> {
        serde_json::from_str(
            r#"[
                {"id": 1, "title": "Complete Snowboard", "handle": "complete-snowboard",
                 "vendor": "Snowboard Vendor", "product_type": "snowboard",
                 "tags": "Premium, Snow, Winter",
                 "body_html": "<p>This PREMIUM snowboard is so SUPER DUPER awesome!</p>",
                 "options": [{"name": "Color", "values": ["Ice", "Dawn", "Powder"]}],
                 "variants": [{"id": 11, "price": "699.95", "option1": "Ice"}]},
                {"id": 2, "title": "Gift Card", "handle": "gift-card", "vendor": "Store Team",
                 "product_type": "giftcard", "body_html": "This is a gift card for the store",
                 "variants": [{"id": 21, "price": "10.00", "option1": "$10"},
                              {"id": 22, "price": "25.00", "option1": "$25"}]},
                {"id": 3, "title": "Leather Belt", "handle": "leather-belt", "vendor": "Starky",
                 "product_type": "Accessories", "tags": "leather, sale",
                 "options": [{"name": "Color", "values": ["Brown", "Black"]}],
                 "variants": [{"id": 31, "price": "50.00", "compare_at_price": "100.00", "option1": "Brown"}]},
                {"id": 4, "title": "Canvas Belt", "handle": "canvas-belt", "vendor": "Starky",
                 "product_type": "Accessories",
                 "options": [{"name": "Color", "values": ["Red", "Navy"]}],
                 "variants": [{"id": 41, "price": "15.00", "option1": "Red"}]}
            ]"#,
        )
        .unwrap()
    }

    /// The catalog plus one extra product.
    fn catalog_with(product_json: &str) -> Vec<Product> {
        let mut products = catalog();
        products.push(serde_json::from_str(product_json).unwrap());
        products
    }

    fn format_ctx() -> FormatContext {
        FormatContext::new(
            CurrencyCode::USD,
            Some("https://starky-shop.myshopify.com".to_string()),
        )
        .with_now("2024-07-15T12:00:00Z".parse().unwrap())
    }

    fn ask(question: &str, products: &[Product]) -> Routed {
        let format = format_ctx();
        let shop = Shop {
            products,
            format: &format,
            store_name: STORE,
        };
        route(&Inquiry::new(question), &shop)
    }

    #[test]
    fn test_rule_table_ends_with_fallback() {
        let last = RULES.last().unwrap();
        assert_eq!(last.name, "fallback");
        assert!(RULES.iter().all(|rule| !rule.name.is_empty()));
    }

    #[test]
    fn test_greeting() {
        let reply = ask("hello", &catalog());
        assert_eq!(reply.rule, "greeting");
        assert!(reply.text.contains("Welcome to Starky Shop"));

        assert_eq!(ask("Good morning!", &catalog()).rule, "greeting");
    }

    #[test]
    fn test_greeting_does_not_need_catalog() {
        let reply = ask("hi", &[]);
        assert_eq!(reply.rule, "greeting");
        assert_ne!(reply.text, NO_DATA_MESSAGE);
    }

    #[test]
    fn test_long_message_with_greeting_word_is_not_a_greeting() {
        let reply = ask("hi, what is the price of the leather belt?", &catalog());
        assert_eq!(reply.rule, "price");
    }

    #[test]
    fn test_color_question_for_one_product() {
        let reply = ask("What colors does the snowboard come in?", &catalog());
        assert_eq!(reply.rule, "color_clarification");
        assert_eq!(reply.text, "Complete Snowboard is available in: Dawn, Ice, Powder");
    }

    #[test]
    fn test_color_question_for_several_products() {
        let reply = ask("What colors do the belts come in?", &catalog());
        assert_eq!(reply.rule, "color_clarification");
        assert!(reply.text.starts_with("Which product do you mean?"));
        assert!(reply.text.contains("Leather Belt"));
        assert!(reply.text.contains("Canvas Belt"));
    }

    #[test]
    fn test_color_question_without_product() {
        let reply = ask("which colours are there", &catalog());
        assert_eq!(reply.rule, "color_clarification");
        assert!(reply.text.starts_with("Which product would you like"));
    }

    #[test]
    fn test_named_color_lists_products() {
        let reply = ask("anything in navy?", &catalog());
        assert_eq!(reply.rule, "color");
        assert!(reply.text.starts_with("Here's what we have in Navy"));
        assert!(reply.text.contains("**Canvas Belt**"));
        assert!(!reply.text.contains("**Leather Belt**"));
    }

    #[test]
    fn test_named_color_narrowed_by_product() {
        let reply = ask("do you have a red belt", &catalog());
        assert_eq!(reply.rule, "color");
        assert!(reply.text.contains("**Canvas Belt**"));
    }

    #[test]
    fn test_color_needs_word_boundary() {
        // "ordered" contains "red" but names no color.
        let reply = ask("I ordered yesterday, where is my tracking info for the order", &catalog());
        assert_eq!(reply.rule, "store_policy");
        assert_eq!(reply.text, TRACK_ORDER_MESSAGE);
    }

    #[test]
    fn test_plural_question_words_are_singularized() {
        assert_eq!(Inquiry::new("Show me snowboards").terms.tokens, ["snowboard"]);
        assert_eq!(Inquiry::new("belts and boxes").terms.tokens, ["belt", "box"]);
    }

    #[test]
    fn test_show_all() {
        let reply = ask("Show all products", &catalog());
        assert_eq!(reply.rule, "show_all");
        assert!(reply.text.contains("(4 products)"));
        assert!(reply.text.contains("1. Complete Snowboard - $699.95"));
        assert!(reply.text.contains("4. Canvas Belt - $15.00"));
    }

    #[test]
    fn test_price_range_under() {
        let reply = ask("products under 60", &catalog());
        assert_eq!(reply.rule, "price");
        assert!(reply.text.starts_with("Products under $60.00:"));
        assert!(reply.text.contains("- Gift Card: $10.00"));
        assert!(reply.text.contains("- Leather Belt: $50.00 (was $100.00, 50% off)"));
        assert!(!reply.text.contains("Complete Snowboard"));
    }

    #[test]
    fn test_price_range_between_with_product_words() {
        let reply = ask("belts between 20 and 80", &catalog());
        assert!(reply.text.starts_with("Products between $20.00 and $80.00:"));
        assert!(reply.text.contains("Leather Belt"));
        assert!(!reply.text.contains("Canvas Belt"));
    }

    #[test]
    fn test_price_range_without_results() {
        let reply = ask("anything under 5", &catalog());
        assert_eq!(reply.text, "No products found under $5.00.");
    }

    #[test]
    fn test_price_for_named_product() {
        let reply = ask("How much is the snowboard?", &catalog());
        assert_eq!(reply.rule, "price");
        assert_eq!(reply.text, "Here are the prices:\n- Complete Snowboard: $699.95");
    }

    #[test]
    fn test_discounts() {
        let reply = ask("What's on sale?", &catalog());
        assert_eq!(reply.rule, "discount");
        assert!(reply.text.contains("Leather Belt"));
        assert!(!reply.text.contains("Canvas Belt"));
    }

    #[test]
    fn test_discounts_include_running_price_rules() {
        let products = catalog_with(
            r#"{"id": 5, "title": "Wool Scarf", "variants": [{"id": 51, "price": "30.00"}],
                "discount_rules": [
                    {"id": 9, "title": "SUMMER", "value_type": "percentage", "value": "-10.0",
                     "codes": ["SUMMER10"]},
                    {"id": 8, "title": "SPRING", "value_type": "percentage", "value": "-20.0",
                     "ends_at": "2024-05-01T00:00:00Z", "codes": ["SPRING20"]}
                ]}"#,
        );
        let reply = ask("any discount codes running?", &products);
        assert_eq!(reply.rule, "discount");
        assert!(reply.text.contains("- Leather Belt: $50.00 (was $100.00, 50% off)"));
        assert!(
            reply
                .text
                .contains("- Wool Scarf: $30.00 | Offers: SUMMER: 10% off (code SUMMER10)")
        );
        assert!(!reply.text.contains("SPRING20"));
    }

    #[test]
    fn test_offer_alone_is_not_a_discount_question() {
        let reply = ask("Do you offer international shipping?", &catalog());
        assert_eq!(reply.rule, "shipping");
        assert_eq!(reply.text, INTERNATIONAL_SHIPPING_MESSAGE);

        let reply = ask("Do you offer free returns?", &catalog());
        assert_eq!(reply.rule, "store_policy");
        assert_eq!(reply.text, RETURN_POLICY_MESSAGE);

        assert_eq!(ask("Any special offers this week?", &catalog()).rule, "discount");
    }

    #[test]
    fn test_no_discounts() {
        let products: Vec<Product> = catalog().into_iter().filter(|p| p.id.as_i64() != 3).collect();
        let reply = ask("any discounts?", &products);
        assert_eq!(reply.text, NO_SALE_MESSAGE);
    }

    #[test]
    fn test_vendor_listing() {
        let reply = ask("Which brands do you carry?", &catalog());
        assert_eq!(reply.rule, "product_details");
        assert_eq!(
            reply.text,
            "We carry products from: Snowboard Vendor, Starky, Store Team"
        );
    }

    #[test]
    fn test_product_mentioned_by_title() {
        let reply = ask("Tell me about the Leather Belt", &catalog());
        assert_eq!(reply.rule, "product_details");
        assert!(reply.text.starts_with("**Leather Belt**"));
        assert!(!reply.text.contains("Canvas Belt"));
    }

    #[test]
    fn test_buy_links_are_bare() {
        let reply = ask("where can I buy the gift card", &catalog());
        assert_eq!(reply.rule, "product_details");

        let reply = ask("buy snowboard", &catalog());
        assert_eq!(reply.rule, "buy_link");
        assert_eq!(
            reply.text,
            "You can buy here:\n- Complete Snowboard: https://starky-shop.myshopify.com/products/complete-snowboard"
        );
    }

    #[test]
    fn test_shipping() {
        let reply = ask("Do you ship internationally?", &catalog());
        assert_eq!(reply.rule, "shipping");
        assert_eq!(reply.text, INTERNATIONAL_SHIPPING_MESSAGE);

        let reply = ask("how long does delivery take", &[]);
        assert_eq!(reply.text, DOMESTIC_SHIPPING_MESSAGE);
    }

    #[test]
    fn test_store_policy() {
        assert_eq!(ask("How do I track my order?", &catalog()).text, TRACK_ORDER_MESSAGE);
        assert_eq!(ask("Can I cancel my order?", &[]).text, CANCEL_ORDER_MESSAGE);
        assert_eq!(ask("What is your return policy?", &catalog()).text, RETURN_POLICY_MESSAGE);
        assert_eq!(ask("What payment methods do you accept?", &catalog()).text, PAYMENT_MESSAGE);
    }

    #[test]
    fn test_store_faq() {
        let cases = [
            ("Is there a discount on my first purchase?", FIRST_PURCHASE_MESSAGE),
            ("How do I apply a coupon?", APPLY_COUPON_MESSAGE),
            ("Can I change my delivery address?", CHANGE_ADDRESS_MESSAGE),
            ("How do I create an account?", CREATE_ACCOUNT_MESSAGE),
            ("What are the benefits of an account?", ACCOUNT_BENEFITS_MESSAGE),
            ("Are prices inclusive of tax?", TAX_MESSAGE),
            ("How do I add items to my cart?", ADD_TO_CART_MESSAGE),
            ("Does the snowboard have a warranty?", WARRANTY_MESSAGE),
            ("Can I pre-order the snowboard?", PRE_ORDER_MESSAGE),
            ("Do you offer gift wrapping?", GIFT_WRAP_MESSAGE),
            ("How do I check my loyalty points?", LOYALTY_MESSAGE),
            ("Where is the size chart for clothing?", SIZE_MESSAGE),
            ("What is the status of my refund?", REFUND_STATUS_MESSAGE),
            ("How can I contact customer service?", CONTACT_MESSAGE),
            ("What are the care instructions for leather?", CARE_MESSAGE),
            ("Do you sell bundles?", BUNDLE_MESSAGE),
            ("Can I leave a review?", REVIEW_MESSAGE),
            ("My belt arrived damaged", DAMAGED_ITEM_MESSAGE),
            ("Can I exchange the belt?", EXCHANGE_MESSAGE),
            ("Can I pay with a debit card?", PAYMENT_MESSAGE),
        ];
        for (question, expected) in cases {
            let reply = ask(question, &catalog());
            assert_eq!(reply.rule, "store_policy", "{question}");
            assert_eq!(reply.text, expected, "{question}");
        }
    }

    #[test]
    fn test_store_faq_does_not_need_catalog() {
        let reply = ask("Can I pre-order?", &[]);
        assert_eq!(reply.text, PRE_ORDER_MESSAGE);
    }

    #[test]
    fn test_new_arrivals() {
        let reply = ask("Show me your new arrivals", &catalog());
        assert_eq!(reply.rule, "new_arrivals");
        assert_eq!(reply.text, NEW_ARRIVALS_MESSAGE);

        let products = catalog_with(
            r#"{"id": 5, "title": "Wool Scarf", "tags": "winter, New",
                "variants": [{"id": 51, "price": "30.00"}]}"#,
        );
        let reply = ask("What's new?", &products);
        assert_eq!(reply.rule, "new_arrivals");
        assert_eq!(reply.text, "Here are our latest arrivals:\n- Wool Scarf: $30.00");

        assert_eq!(ask("latest products", &[]).text, NO_DATA_MESSAGE);
    }

    #[test]
    fn test_stock_for_named_product() {
        let products = catalog_with(
            r#"{"id": 5, "title": "Wool Scarf",
                "variants": [{"id": 51, "price": "30.00", "inventory_quantity": 2,
                              "inventory_levels": [{"available": 3, "location_id": 1}]},
                             {"id": 52, "price": "30.00", "inventory_quantity": 0}]}"#,
        );
        let reply = ask("Is the wool scarf in stock?", &products);
        assert_eq!(reply.rule, "stock");
        assert_eq!(reply.text, "Current availability:\n- Wool Scarf: In stock (3 available)");
    }

    #[test]
    fn test_stock_without_inventory_data() {
        let reply = ask("Is the leather belt in stock?", &catalog());
        assert_eq!(reply.rule, "stock");
        assert_eq!(reply.text, STOCK_MESSAGE);

        let reply = ask("when will things be restocked", &catalog());
        assert_eq!(reply.text, STOCK_MESSAGE);
    }

    #[test]
    fn test_fallback_prefers_attribute_matches() {
        let reply = ask("Show me snowboards", &catalog());
        assert_eq!(reply.rule, "fallback");
        assert!(reply.text.contains("**Complete Snowboard**"));
        assert!(!reply.text.contains("Gift Card"));
    }

    #[test]
    fn test_fallback_help_when_nothing_matches() {
        let reply = ask("zzzz qqqq", &catalog());
        assert_eq!(reply.rule, "fallback");
        assert_eq!(reply.text, help_message(STORE));
    }

    #[test]
    fn test_product_rules_report_missing_data() {
        for question in ["show all products", "what's on sale", "price of belts", "buy a belt"] {
            let reply = ask(question, &[]);
            assert_eq!(reply.text, NO_DATA_MESSAGE, "{question}");
        }
        assert_eq!(ask("Show me snowboards", &[]).text, NO_DATA_MESSAGE);
    }
}
