//! Utility modules shared by the analyzer and report formatting
//!
//! - Text: identifier/display-name conversion, slugs, percentages

pub mod text;

pub use text::{percent, slugify, title_case};
