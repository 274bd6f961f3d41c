//! Product cards and listings for chat replies.

use shop_assistant_core::matching::extract_colors;
use shop_assistant_core::matching::text::{clean_html, truncate_chars};
use chrono::{DateTime, Utc};
use shop_assistant_core::{CurrencyCode, DiscountRule, Price, Product, StockLevel};

/// Description length shown on a card before it is cut with `...`.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 90;

/// Values every formatter needs: the catalog currency, where products
/// live on the storefront, and the moment price rules are checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatContext {
    pub currency: CurrencyCode,
    /// Storefront root without a trailing slash; links are omitted when unset.
    pub base_url: Option<String>,
    pub now: DateTime<Utc>,
}

impl FormatContext {
    #[must_use]
    pub fn new(currency: CurrencyCode, base_url: Option<String>) -> Self {
        Self {
            currency,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            now: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// `{base_url}/products/{handle}` when both parts are known.
    #[must_use]
    pub fn product_url(&self, product: &Product) -> Option<String> {
        let base = self.base_url.as_deref()?;
        let handle = product.handle.as_deref().filter(|h| !h.trim().is_empty())?;
        Some(format!("{base}/products/{handle}"))
    }

    /// Representative price with symbol, e.g. `$19.99`.
    #[must_use]
    pub fn price(&self, product: &Product) -> Option<String> {
        product
            .price()
            .map(|amount| Price::new(amount, self.currency).to_string())
    }

    /// Price text including any discount, e.g. `$50.00 (was $100.00, 50% off)`.
    #[must_use]
    pub fn price_with_discount(&self, product: &Product) -> String {
        let Some(amount) = product.price() else {
            return "Price not available".to_string();
        };
        let price = Price::new(amount, self.currency);
        match product
            .compare_at_price()
            .and_then(|compare_at| price.discount_percent(compare_at).map(|pct| (compare_at, pct)))
        {
            Some((compare_at, pct)) => format!(
                "{price} (was {}, {pct:.0}% off)",
                Price::new(compare_at, self.currency)
            ),
            None => price.to_string(),
        }
    }

    /// One discount, e.g. `SUMMER: 10% off (code SUMMER10)`.
    #[must_use]
    pub fn discount_text(&self, rule: &DiscountRule) -> String {
        let amount = match rule.amount_off() {
            Some(pct) if rule.is_percentage() => format!("{}% off", pct.normalize()),
            Some(amount) => format!("{} off", Price::new(amount, self.currency)),
            None => "special offer".to_string(),
        };
        let title = if rule.title.trim().is_empty() {
            "Offer"
        } else {
            rule.title.as_str()
        };
        match rule.codes.as_slice() {
            [] => format!("{title}: {amount}"),
            [code] => format!("{title}: {amount} (code {code})"),
            codes => format!("{title}: {amount} (codes {})", codes.join(", ")),
        }
    }

    /// Active discounts joined with `; `, or `None` when nothing is running.
    #[must_use]
    pub fn offers(&self, product: &Product) -> Option<String> {
        let offers: Vec<String> = product
            .active_discounts(self.now)
            .map(|rule| self.discount_text(rule))
            .collect();
        (!offers.is_empty()).then(|| offers.join("; "))
    }
}

/// Stock wording, or `None` when no variant tracks inventory.
#[must_use]
pub fn stock_text(product: &Product) -> Option<String> {
    match product.stock_level() {
        StockLevel::Untracked => None,
        StockLevel::Available(n) => Some(format!("In stock ({n} available)")),
        StockLevel::Backorder => Some("Out of stock, available to order".to_string()),
        StockLevel::SoldOut => Some("Out of stock".to_string()),
    }
}

fn push_availability(out: &mut String, ctx: &FormatContext, product: &Product) {
    if let Some(stock) = stock_text(product) {
        out.push_str("\nStock: ");
        out.push_str(&stock);
    }
    if let Some(offers) = ctx.offers(product) {
        out.push_str("\nOffers: ");
        out.push_str(&offers);
    }
}

/// A multi-line display card for one product.
#[must_use]
pub fn product_card(ctx: &FormatContext, product: &Product) -> String {
    let description = clean_html(&product.body_html);
    let description = if description.is_empty() {
        "No description available".to_string()
    } else {
        truncate_chars(&description, DESCRIPTION_PREVIEW_CHARS)
    };

    let tags = if product.tags.is_empty() {
        "No tags".to_string()
    } else {
        product.tags.joined()
    };

    let colors = extract_colors(product);
    let colors = if colors.is_empty() {
        "No color options".to_string()
    } else {
        colors.into_iter().collect::<Vec<_>>().join(", ")
    };

    let vendor = if product.vendor.trim().is_empty() {
        "Unknown vendor"
    } else {
        product.vendor.as_str()
    };

    let mut card = format!(
        "**{}**\nPrice: {}\nDescription: {description}\nTags: {tags}\nColors: {colors}\nVendor: {vendor}",
        product.title,
        ctx.price_with_discount(product),
    );
    push_availability(&mut card, ctx, product);
    if let Some(url) = ctx.product_url(product) {
        card.push_str("\nLink: ");
        card.push_str(&url);
    }
    card
}

/// Cards for several products separated by blank lines.
#[must_use]
pub fn product_cards<'a, I>(ctx: &FormatContext, products: I) -> String
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .map(|product| product_card(ctx, product))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One `- Title: price` line per product.
#[must_use]
pub fn price_lines<'a, I>(ctx: &FormatContext, products: I) -> String
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .map(|product| format!("- {}: {}", product.title, ctx.price_with_discount(product)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `- Title: url` line per product that has a link.
#[must_use]
pub fn link_lines<'a, I>(ctx: &FormatContext, products: I) -> String
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .filter_map(|product| {
            ctx.product_url(product)
                .map(|url| format!("- {}: {url}", product.title))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Product block used as generator context.
#[must_use]
pub fn context_entry(ctx: &FormatContext, index: usize, product: &Product) -> String {
    let description = clean_html(&product.body_html);
    let tags = if product.tags.is_empty() {
        "No tags".to_string()
    } else {
        product.tags.joined()
    };
    let colors = extract_colors(product);

    let mut entry = format!(
        "Product {index}: {}\nPrice: {}\nCategory: {}\nBrand: {}\nTags: {tags}",
        product.title,
        ctx.price_with_discount(product),
        if product.product_type.is_empty() { "General" } else { &product.product_type },
        if product.vendor.is_empty() { "Unknown vendor" } else { &product.vendor },
    );
    if !colors.is_empty() {
        entry.push_str("\nColors: ");
        entry.push_str(&colors.into_iter().collect::<Vec<_>>().join(", "));
    }
    entry.push_str("\nDescription: ");
    entry.push_str(if description.is_empty() {
        "No description available"
    } else {
        &description
    });
    push_availability(&mut entry, ctx, product);
    if let Some(url) = ctx.product_url(product) {
        entry.push_str("\nLink: ");
        entry.push_str(&url);
    }
    entry
}
