//! Analyzer Data Model
//!
//! Request-scoped structures produced by one analysis: symptoms, scored
//! conditions, treatments and the final diagnosis result, plus the closed
//! enums used to tag them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;
use crate::knowledge_base::{ConditionRecord, TreatmentType, Urgency};

/// Identifier of the synthesized "nothing wrong" symptom and condition.
pub const HEALTHY_PLANT: &str = "healthy_plant";
pub const HEALTHY: &str = "healthy";
/// Identifier of the implicit-problem symptom.
pub const GENERAL_STRESS: &str = "general_stress";
/// Placeholder condition for degenerate input.
pub const ANALYSIS_INCOMPLETE: &str = "analysis_incomplete";

// ============================================================================
// Symptoms
// ============================================================================

/// Where an extracted symptom came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomSource {
    ConditionName,
    ConditionSymptom,
    ConditionKeyword,
    VisualCue,
    DirectObservation,
    ImplicitDetection,
    DefaultAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub name: String,
    pub text_match: String,
    pub confidence: f64,
    pub source: SymptomSource,
}

impl Symptom {
    pub fn is_healthy(&self) -> bool {
        self.name == HEALTHY_PLANT
    }
}

// ============================================================================
// Conditions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Fungal,
    Bacterial,
    Viral,
    Insect,
    Environmental,
    Nutritional,
    Other,
    Healthy,
    Pathogenic,
    Unknown,
}

impl ConditionCategory {
    /// Infectious disease categories.
    pub fn is_disease(&self) -> bool {
        matches!(
            self,
            ConditionCategory::Fungal | ConditionCategory::Bacterial | ConditionCategory::Viral
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCategory::Fungal => "fungal",
            ConditionCategory::Bacterial => "bacterial",
            ConditionCategory::Viral => "viral",
            ConditionCategory::Insect => "insect",
            ConditionCategory::Environmental => "environmental",
            ConditionCategory::Nutritional => "nutritional",
            ConditionCategory::Other => "other",
            ConditionCategory::Healthy => "healthy",
            ConditionCategory::Pathogenic => "pathogenic",
            ConditionCategory::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRole {
    Primary,
    Secondary,
}

/// How a scored condition entered the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSource {
    DatabaseMatch,
    PlantSpecific,
    GenericFallback,
    HealthyAssessment,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCondition {
    pub name: String,
    pub score: f64,
    pub matched_symptoms: Vec<String>,
    pub record: Arc<ConditionRecord>,
    pub confidence: f64,
    pub category: ConditionCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ConditionRole>,
    pub source: ConditionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ScoredCondition {
    pub fn display_name(&self) -> &str {
        if self.record.display_name.is_empty() {
            &self.name
        } else {
            &self.record.display_name
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.category == ConditionCategory::Healthy
    }
}

// ============================================================================
// Severity & Confidence
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Mild,
    Moderate,
    High,
    Critical,
    /// Only produced by the degenerate-input fallback.
    Unknown,
}

impl Severity {
    /// One tier down, never below mild. `None`/`Unknown` are left alone.
    pub fn downgrade(self) -> Self {
        match self {
            Severity::Critical => Severity::High,
            Severity::High => Severity::Moderate,
            Severity::Moderate | Severity::Mild => Severity::Mild,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Severity::Critical => "Immediate attention required",
            Severity::High => "Prompt treatment needed",
            Severity::Moderate => "Monitor and treat",
            Severity::Mild => "Watch closely",
            Severity::None => "No immediate concerns",
            Severity::Unknown => "Unable to assess",
        }
    }
}

/// Overall diagnostic confidence reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Moderate,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            ConfidenceTier::High
        } else if confidence > 0.5 {
            ConfidenceTier::Medium
        } else if confidence > 0.3 {
            ConfidenceTier::Moderate
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Low => "low",
            ConfidenceTier::Moderate => "moderate",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::High => "high",
        }
    }
}

/// Confidence bands that drive how assertive recommendations are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Low,
    Likely,
    Confident,
}

impl ConfidenceBand {
    pub const LIKELY_THRESHOLD: f64 = 0.4;
    pub const CONFIDENT_THRESHOLD: f64 = 0.6;

    pub fn try_from_confidence(confidence: f64) -> Result<Self, AnalyzerError> {
        if !confidence.is_finite() {
            return Err(AnalyzerError::InvalidConfidence(confidence));
        }
        Ok(if confidence < Self::LIKELY_THRESHOLD {
            ConfidenceBand::Low
        } else if confidence < Self::CONFIDENT_THRESHOLD {
            ConfidenceBand::Likely
        } else {
            ConfidenceBand::Confident
        })
    }

    /// Urgency tiers removed from a treatment in this band.
    pub fn urgency_reduction(&self) -> usize {
        match self {
            ConfidenceBand::Low => 2,
            ConfidenceBand::Likely => 1,
            ConfidenceBand::Confident => 0,
        }
    }

    /// Soften a treatment action to match the band.
    pub fn rewrite_action(&self, action: &str) -> String {
        match self {
            ConfidenceBand::Low if !action.starts_with("Consider") => {
                format!("Consider {}", lowercase_first(action))
            }
            ConfidenceBand::Likely if !action.starts_with("Likely") => {
                format!("Likely need to {}", lowercase_first(action))
            }
            _ => action.to_string(),
        }
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Treatments & Result
// ============================================================================

/// How a treatment entry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentSource {
    Database,
    LowConfidenceAdvice,
    GeneralAdvice,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    #[serde(rename = "type")]
    pub kind: TreatmentType,
    pub action: String,
    pub details: Vec<String>,
    pub products: Vec<String>,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub source: TreatmentSource,
}

/// Structured output of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub raw_text: String,
    pub symptoms: Vec<Symptom>,
    pub severity: Severity,
    pub conditions: Vec<ScoredCondition>,
    pub treatments: Vec<Treatment>,
    pub immediate_actions: Vec<String>,
    pub prevention_tips: Vec<String>,
    pub confidence: ConfidenceTier,
    pub analysis_type: String,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiagnosisResult {
    pub fn primary(&self) -> Option<&ScoredCondition> {
        self.conditions.first()
    }

    pub fn is_healthy(&self) -> bool {
        self.primary().is_some_and(ScoredCondition::is_healthy)
    }
}
