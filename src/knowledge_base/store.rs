//! Knowledge Base Store
//!
//! Loads the condition table and advice lists from JSON and answers the
//! lookups the analyzer needs. Every query is read-only; unknown keys return
//! empty slices or `None`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::types::{
    AdviceCategory, ConditionRecord, PlantAdvice, Season, TreatmentCategoryInfo, TreatmentType,
};

const BUILTIN_JSON: &str = include_str!("../../data/knowledge_base.json");

/// Search weight for an exact symptom-identifier hit.
const EXACT_SYMPTOM_WEIGHT: f64 = 2.0;
/// Search weight when a keyword phrase occurs inside the symptom identifier.
const KEYWORD_WEIGHT: f64 = 1.0;

/// A condition returned by [`KnowledgeBase::search_by_symptoms`].
#[derive(Debug, Clone)]
pub struct ConditionMatch<'a> {
    pub name: &'a str,
    pub record: &'a Arc<ConditionRecord>,
    pub score: f64,
}

/// On-disk layout. Conditions stay as raw values so one bad entry does not
/// sink the whole table.
#[derive(Debug, Deserialize)]
struct RawKnowledgeBase {
    conditions: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    treatment_categories: FxHashMap<String, serde_json::Value>,
    #[serde(default)]
    general_advice: FxHashMap<String, Vec<String>>,
    #[serde(default)]
    seasonal_advice: FxHashMap<String, Vec<String>>,
    #[serde(default)]
    plant_specific_advice: FxHashMap<String, PlantAdvice>,
}

/// Immutable plant-health knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    conditions: FxHashMap<String, Arc<ConditionRecord>>,
    sorted_names: Vec<String>,
    treatment_categories: FxHashMap<TreatmentType, TreatmentCategoryInfo>,
    general_advice: FxHashMap<String, Vec<String>>,
    seasonal_advice: FxHashMap<String, Vec<String>>,
    plant_advice: FxHashMap<String, PlantAdvice>,
}

impl KnowledgeBase {
    /// Knowledge base compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_JSON).context("Failed to parse built-in knowledge base")
    }

    /// Load a replacement knowledge base from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base file: {:?}", path))?;

        Self::from_json_str(&contents)
            .with_context(|| format!("Failed to parse knowledge base file: {:?}", path))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawKnowledgeBase =
            serde_json::from_str(json).context("Knowledge base is not a valid document")?;

        let mut conditions = FxHashMap::default();
        for (key, value) in raw.conditions {
            match serde_json::from_value::<ConditionRecord>(value) {
                Ok(mut record) => {
                    record.name = key.clone();
                    conditions.insert(key, Arc::new(record));
                }
                Err(e) => {
                    tracing::warn!("Skipping malformed condition '{}': {}", key, e);
                }
            }
        }

        if conditions.is_empty() {
            bail!("Knowledge base contains no usable conditions");
        }

        let mut treatment_categories = FxHashMap::default();
        for (tag, value) in raw.treatment_categories {
            match serde_json::from_value::<TreatmentCategoryInfo>(value) {
                Ok(info) => {
                    treatment_categories.insert(TreatmentType::parse(&tag), info);
                }
                Err(e) => {
                    tracing::warn!("Skipping malformed treatment category '{}': {}", tag, e);
                }
            }
        }

        let mut sorted_names: Vec<String> = conditions.keys().cloned().collect();
        sorted_names.sort();

        let plant_advice = raw
            .plant_specific_advice
            .into_iter()
            .map(|(plant, advice)| (plant.to_lowercase(), advice))
            .collect();

        tracing::debug!("Loaded knowledge base with {} conditions", conditions.len());

        Ok(Self {
            conditions,
            sorted_names,
            treatment_categories,
            general_advice: raw.general_advice,
            seasonal_advice: raw.seasonal_advice,
            plant_advice,
        })
    }

    // ========================================================================
    // Condition lookups
    // ========================================================================

    pub fn get(&self, name: &str) -> Option<&Arc<ConditionRecord>> {
        self.conditions.get(name)
    }

    pub fn all(&self) -> &FxHashMap<String, Arc<ConditionRecord>> {
        &self.conditions
    }

    /// Condition keys in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sorted_names.iter().map(String::as_str)
    }

    /// Records in key order.
    pub fn records(&self) -> impl Iterator<Item = &Arc<ConditionRecord>> {
        self.sorted_names.iter().filter_map(|name| self.conditions.get(name))
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Score every condition against a list of symptom identifiers.
    ///
    /// An exact identifier hit is worth 2; otherwise a symptom earns 1 when
    /// any keyword phrase occurs inside it (underscores read as spaces).
    /// Zero-score conditions are dropped. Sorted by score, ties by name.
    pub fn search_by_symptoms(&self, symptoms: &[&str]) -> Vec<ConditionMatch<'_>> {
        let readable: Vec<String> = symptoms.iter().map(|s| s.replace('_', " ")).collect();

        let mut matches: Vec<ConditionMatch<'_>> = self
            .sorted_names
            .iter()
            .filter_map(|name| {
                let record = self.conditions.get(name)?;
                let score: f64 = symptoms
                    .iter()
                    .zip(&readable)
                    .map(|(symptom, readable)| {
                        if record.has_symptom(symptom) {
                            EXACT_SYMPTOM_WEIGHT
                        } else if record.keywords.iter().any(|k| readable.contains(k.as_str())) {
                            KEYWORD_WEIGHT
                        } else {
                            0.0
                        }
                    })
                    .sum();

                (score > 0.0).then_some(ConditionMatch { name: name.as_str(), record, score })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(b.name)));
        matches
    }

    /// Conditions whose common-plant list names this plant (case-insensitive).
    pub fn search_by_plant(&self, plant: &str) -> Vec<(&str, &Arc<ConditionRecord>)> {
        self.sorted_names
            .iter()
            .filter_map(|name| {
                let record = self.conditions.get(name)?;
                record.affects_plant(plant).then_some((name.as_str(), record))
            })
            .collect()
    }

    /// Conditions offering an emergency-type treatment.
    pub fn emergency_conditions(&self) -> Vec<&Arc<ConditionRecord>> {
        self.records()
            .filter(|r| r.has_treatment(&[TreatmentType::Emergency]))
            .collect()
    }

    /// Conditions offering an organic, biological or cultural treatment.
    pub fn organic_conditions(&self) -> Vec<&Arc<ConditionRecord>> {
        self.records()
            .filter(|r| r.treatments.iter().any(|t| t.kind.is_organic_family()))
            .collect()
    }

    // ========================================================================
    // Advice lookups
    // ========================================================================

    pub fn advice(&self, category: AdviceCategory) -> &[String] {
        self.general_advice
            .get(category.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn seasonal_advice(&self, season: Season) -> &[String] {
        self.seasonal_advice
            .get(season.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn plant_care_tips(&self, plant: &str) -> &[String] {
        self.plant_advice
            .get(&plant.trim().to_lowercase())
            .map(|advice| advice.care_tips.as_slice())
            .unwrap_or(&[])
    }

    pub fn treatment_info(&self, kind: TreatmentType) -> Option<&TreatmentCategoryInfo> {
        self.treatment_categories.get(&kind)
    }
}
