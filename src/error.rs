//! Library error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("invalid symptom pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("no candidate conditions were produced")]
    NoConditions,

    #[error("confidence value {0} is not a finite number")]
    InvalidConfidence(f64),

    #[error("failed to format recommendation text")]
    Format(#[from] std::fmt::Error),
}
