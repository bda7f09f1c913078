//! Plant Diagnosis Rust Implementation
//!
//! Converts free-text plant descriptions from a vision-language model into a
//! structured health report: symptoms, ranked conditions, severity,
//! confidence, treatments and care tips.
//!
//! Layout:
//! - `knowledge_base/`: Condition records and advice tables (JSON, loaded once)
//! - `analyzer/`: Symptom extraction, condition matching, severity, composition
//! - `report`: Text and markdown presentation of a diagnosis
//! - `utils/`: Shared text helpers

pub mod analyzer;
pub mod error;
pub mod knowledge_base;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use analyzer::{
    AnalysisRequest, AnalyzerConfig, ConditionCategory, ConfidenceTier, DiagnosisResult,
    PlantHealthAnalyzer, ScoredCondition, Severity, Symptom, Treatment,
};
pub use error::AnalyzerError;
pub use knowledge_base::{ConditionRecord, KnowledgeBase, Season, TreatmentType, Urgency};
