//! Generative Language API (Gemini) integration.
//!
//! Sends one prompt per chat turn to `models/{model}:generateContent` and
//! returns the text of the first candidate. The client implements
//! [`TextGenerator`](crate::reply::TextGenerator), which is all the reply
//! layer depends on.

mod client;
mod error;
pub mod types;

pub use client::GeminiClient;
pub use error::GeminiError;
