//! Knowledge Base Record Types
//!
//! Strongly-typed condition records plus the closed tag enums shared with the
//! analyzer: treatment types, urgencies, recovery stages, advice categories
//! and seasons.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

// ============================================================================
// Treatment Types
// ============================================================================

/// Treatment type tag as stored in the knowledge base.
///
/// Unrecognised tags deserialize to `General` so a new data file never fails
/// to load because of a treatment type this build does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum TreatmentType {
    Emergency,
    Removal,
    Pruning,
    Fungicide,
    Bactericide,
    Antibiotic,
    Systemic,
    Cultural,
    Organic,
    OrganicPesticide,
    Biological,
    Physical,
    Fertilizer,
    Supplement,
    SoilAmendment,
    SoilImprovement,
    Watering,
    Mulching,
    Shading,
    Cooling,
    Protection,
    DamageAssessment,
    Monitoring,
    GeneralCare,
    General,
}

impl TreatmentType {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "emergency" => TreatmentType::Emergency,
            "removal" => TreatmentType::Removal,
            "pruning" => TreatmentType::Pruning,
            "fungicide" => TreatmentType::Fungicide,
            "bactericide" => TreatmentType::Bactericide,
            "antibiotic" => TreatmentType::Antibiotic,
            "systemic" => TreatmentType::Systemic,
            "cultural" => TreatmentType::Cultural,
            "organic" => TreatmentType::Organic,
            "organic_pesticide" => TreatmentType::OrganicPesticide,
            "biological" => TreatmentType::Biological,
            "physical" => TreatmentType::Physical,
            "fertilizer" => TreatmentType::Fertilizer,
            "supplement" => TreatmentType::Supplement,
            "soil_amendment" => TreatmentType::SoilAmendment,
            "soil_improvement" => TreatmentType::SoilImprovement,
            "watering" => TreatmentType::Watering,
            "mulching" => TreatmentType::Mulching,
            "shading" => TreatmentType::Shading,
            "cooling" => TreatmentType::Cooling,
            "protection" => TreatmentType::Protection,
            "damage_assessment" => TreatmentType::DamageAssessment,
            "monitoring" => TreatmentType::Monitoring,
            "general_care" => TreatmentType::GeneralCare,
            _ => TreatmentType::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentType::Emergency => "emergency",
            TreatmentType::Removal => "removal",
            TreatmentType::Pruning => "pruning",
            TreatmentType::Fungicide => "fungicide",
            TreatmentType::Bactericide => "bactericide",
            TreatmentType::Antibiotic => "antibiotic",
            TreatmentType::Systemic => "systemic",
            TreatmentType::Cultural => "cultural",
            TreatmentType::Organic => "organic",
            TreatmentType::OrganicPesticide => "organic_pesticide",
            TreatmentType::Biological => "biological",
            TreatmentType::Physical => "physical",
            TreatmentType::Fertilizer => "fertilizer",
            TreatmentType::Supplement => "supplement",
            TreatmentType::SoilAmendment => "soil_amendment",
            TreatmentType::SoilImprovement => "soil_improvement",
            TreatmentType::Watering => "watering",
            TreatmentType::Mulching => "mulching",
            TreatmentType::Shading => "shading",
            TreatmentType::Cooling => "cooling",
            TreatmentType::Protection => "protection",
            TreatmentType::DamageAssessment => "damage_assessment",
            TreatmentType::Monitoring => "monitoring",
            TreatmentType::GeneralCare => "general_care",
            TreatmentType::General => "general",
        }
    }

    /// Organic, biological and cultural practices (no synthetic chemistry).
    pub fn is_organic_family(&self) -> bool {
        matches!(
            self,
            TreatmentType::Organic | TreatmentType::Biological | TreatmentType::Cultural
        )
    }
}

impl From<String> for TreatmentType {
    fn from(tag: String) -> Self {
        TreatmentType::parse(&tag)
    }
}

// ============================================================================
// Urgency
// ============================================================================

/// Treatment urgency, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Emergency,
}

impl Urgency {
    const LADDER: [Urgency; 4] = [Urgency::Low, Urgency::Medium, Urgency::High, Urgency::Emergency];

    /// Drop `tiers` levels, flooring at `Low`.
    pub fn step_down(self, tiers: usize) -> Self {
        let level = Self::LADDER.iter().position(|u| *u == self).unwrap_or(0);
        Self::LADDER[level.saturating_sub(tiers)]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Emergency => "emergency",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Urgency::Emergency => "🚨",
            Urgency::High => "⚠️",
            Urgency::Medium => "⚖️",
            Urgency::Low => "📋",
        }
    }
}

// ============================================================================
// Condition Records
// ============================================================================

/// Recovery-time bucket used as the key of a condition's recovery table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStage {
    Mild,
    Moderate,
    Severe,
    Any,
}

/// One treatment template attached to a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentTemplate {
    #[serde(rename = "type")]
    pub kind: TreatmentType,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

/// A diagnosable plant-health condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    /// Table key (e.g. `fungal_leaf_spot`); filled in by the loader.
    #[serde(rename = "key", default)]
    pub name: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub treatments: Vec<TreatmentTemplate>,
    #[serde(default)]
    pub prevention: Vec<String>,
    #[serde(default)]
    pub common_plants: Vec<String>,
    #[serde(default)]
    pub recovery_time: BTreeMap<RecoveryStage, String>,
}

impl ConditionRecord {
    pub fn has_symptom(&self, identifier: &str) -> bool {
        self.symptoms.iter().any(|s| s == identifier)
    }

    pub fn has_treatment(&self, kinds: &[TreatmentType]) -> bool {
        self.treatments.iter().any(|t| kinds.contains(&t.kind))
    }

    /// Case-insensitive membership in the common-plant list.
    pub fn affects_plant(&self, plant: &str) -> bool {
        let plant = plant.trim().to_lowercase();
        !plant.is_empty() && self.common_plants.iter().any(|p| p.to_lowercase() == plant)
    }

    /// Recovery estimate for a stage, falling back to the `any` entry.
    pub fn recovery_for(&self, stage: RecoveryStage) -> Option<&str> {
        self.recovery_time
            .get(&stage)
            .or_else(|| self.recovery_time.get(&RecoveryStage::Any))
            .map(String::as_str)
    }
}

/// Display metadata for a treatment type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentCategoryInfo {
    pub name: String,
    pub urgency: Urgency,
    pub icon: String,
}

/// Plant-specific care notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantAdvice {
    #[serde(default)]
    pub common_issues: Vec<String>,
    #[serde(default)]
    pub care_tips: Vec<String>,
}

// ============================================================================
// Advice Categories & Seasons
// ============================================================================

/// Canned guidance lists held by the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceCategory {
    Emergency,
    HighSeverity,
    Moderate,
    Mild,
    Preventive,
}

impl AdviceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdviceCategory::Emergency => "emergency",
            AdviceCategory::HighSeverity => "high_severity",
            AdviceCategory::Moderate => "moderate",
            AdviceCategory::Mild => "mild",
            AdviceCategory::Preventive => "preventive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Northern-hemisphere meteorological seasons.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn current() -> Self {
        Self::from_month(chrono::Local::now().month())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            other => Err(format!("unknown season '{}'", other)),
        }
    }
}
