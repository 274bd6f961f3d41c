//! Replies produced through a text generator.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use shop_assistant::reply::APOLOGY_MESSAGE;
use shop_assistant_integration_tests::{
    RateLimitedGenerator, StalledGenerator, StaticGenerator, TestApp,
};

#[tokio::test]
async fn test_generated_reply_links_product_titles() {
    let app = TestApp::builder()
        .generator(Arc::new(StaticGenerator(
            "The Complete Snowboard would make a great gift, or grab a Gift Card.",
        )))
        .build();

    let reply = app.ask("What should I buy my brother?", None).await;
    assert_eq!(
        reply,
        "The [Complete Snowboard](https://starky-shop.myshopify.com/products/complete-snowboard) \
         would make a great gift, or grab a [Gift Card](https://starky-shop.myshopify.com/products/gift-card)."
    );
}

#[tokio::test]
async fn test_generator_timeout_returns_apology() {
    let app = TestApp::builder()
        .generator(Arc::new(StalledGenerator))
        .generator_timeout(Duration::from_millis(50))
        .build();

    // An apology with 200, never a 500
    let reply = app.ask("Show me snowboards", None).await;
    assert_eq!(reply, APOLOGY_MESSAGE);
}

#[tokio::test]
async fn test_rate_limit_falls_back_to_keyword_rules() {
    let app = TestApp::builder()
        .generator(Arc::new(RateLimitedGenerator))
        .build();

    let reply = app.ask("Show me snowboards", None).await;
    assert!(reply.contains("**Complete Snowboard**"));
    assert!(!reply.contains("Gift Card"));
}

#[tokio::test]
async fn test_generative_mode_reports_no_data_for_empty_catalog() {
    let app = TestApp::builder()
        .products(Vec::new())
        .generator(Arc::new(StaticGenerator("should not be used")))
        .build();

    let reply = app.ask("Show me snowboards", None).await;
    assert_eq!(reply, shop_assistant::reply::NO_DATA_MESSAGE);
}
