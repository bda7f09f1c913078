//! Plant-health knowledge base
//!
//! Condition records (symptoms, keywords, treatments, prevention, recovery
//! times) plus general, seasonal and plant-specific advice. Loaded once from
//! JSON and shared read-only behind an `Arc`.

pub mod store;
pub mod types;

pub use store::{ConditionMatch, KnowledgeBase};
pub use types::{
    AdviceCategory, ConditionRecord, PlantAdvice, RecoveryStage, Season, TreatmentCategoryInfo,
    TreatmentTemplate, TreatmentType, Urgency,
};
