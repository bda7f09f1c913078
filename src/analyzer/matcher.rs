//! Condition Matching
//!
//! Scores knowledge-base conditions against extracted symptoms, applies the
//! diagnostic hierarchy (mutual exclusions and category dampening), adds
//! plant-specific candidates and returns the top three.
//!
//! Enhanced score for one condition:
//! ```text
//! score = search_score
//!       + Σ specific  (confidence × 4.0)      symptom id in the record's symptom set
//!       + Σ general   (confidence × 1.5)      keyword inside the symptom's matched text
//!       + 2.0 × specific_count                or × 0.7 when only general matches
//!       + 1.0 per common plant named in the context
//!       + min(0.5 × keywords in full text, 2.0)
//! confidence = min(score / 10, 1)
//! ```

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::knowledge_base::{
    AdviceCategory, ConditionRecord, KnowledgeBase, TreatmentTemplate, TreatmentType,
};
use crate::utils::title_case;

use super::types::{
    ConditionCategory, ConditionRole, ConditionSource, ScoredCondition, Symptom, GENERAL_STRESS,
    HEALTHY, HEALTHY_PLANT,
};

// ============================================================================
// Scoring constants
// ============================================================================

pub const SPECIFIC_MATCH_WEIGHT: f64 = 4.0;
pub const GENERAL_MATCH_WEIGHT: f64 = 1.5;
pub const SPECIFIC_MATCH_BONUS: f64 = 2.0;
pub const GENERAL_ONLY_FACTOR: f64 = 0.7;
pub const PLANT_CONTEXT_BONUS: f64 = 1.0;
pub const TEXT_KEYWORD_BONUS: f64 = 0.5;
pub const MAX_TEXT_KEYWORD_BONUS: f64 = 2.0;
pub const SCORE_SCALE: f64 = 10.0;

pub const PLANT_SPECIFIC_BASE: f64 = 1.0;
pub const PLANT_SPECIFIC_SCALE: f64 = 8.0;
pub const PLANT_SPECIFIC_BONUS: f64 = 1.0;

pub const EXCLUSION_FACTOR: f64 = 0.3;
pub const SAME_CATEGORY_FACTOR: f64 = 0.4;
pub const COFACTOR_FACTOR: f64 = 0.7;
pub const PEST_SECONDARY_FACTOR: f64 = 0.6;
pub const MIN_SECONDARY_CONFIDENCE: f64 = 0.25;
pub const MAX_CONDITIONS: usize = 3;

const HEALTHY_SCORE: f64 = 10.0;
const HEALTHY_CONFIDENCE: f64 = 0.9;
const GENERIC_SCORE: f64 = 5.0;
const GENERIC_CONFIDENCE: f64 = 0.4;

pub const POSSIBLY_SECONDARY_NOTE: &str = "possibly secondary to primary condition";

// ============================================================================
// Static tables
// ============================================================================

static CONDITION_CATEGORIES: &[(&str, ConditionCategory)] = &[
    ("fungal_leaf_spot", ConditionCategory::Fungal),
    ("rust_disease", ConditionCategory::Fungal),
    ("powdery_mildew", ConditionCategory::Fungal),
    ("anthracnose", ConditionCategory::Fungal),
    ("downy_mildew", ConditionCategory::Fungal),
    ("black_spot", ConditionCategory::Fungal),
    ("bacterial_spot", ConditionCategory::Bacterial),
    ("fire_blight", ConditionCategory::Bacterial),
    ("crown_gall", ConditionCategory::Bacterial),
    ("mosaic_virus", ConditionCategory::Viral),
    ("yellows_virus", ConditionCategory::Viral),
    ("nitrogen_deficiency", ConditionCategory::Nutritional),
    ("potassium_deficiency", ConditionCategory::Nutritional),
    ("phosphorus_deficiency", ConditionCategory::Nutritional),
    ("iron_deficiency", ConditionCategory::Nutritional),
    ("magnesium_deficiency", ConditionCategory::Nutritional),
    ("calcium_deficiency", ConditionCategory::Nutritional),
    ("water_stress", ConditionCategory::Environmental),
    ("heat_stress", ConditionCategory::Environmental),
    ("cold_stress", ConditionCategory::Environmental),
    ("sunscald", ConditionCategory::Environmental),
    ("edema", ConditionCategory::Environmental),
    ("insect_damage", ConditionCategory::Insect),
    ("aphid_infestation", ConditionCategory::Insect),
    ("spider_mite_damage", ConditionCategory::Insect),
    ("scale_insects", ConditionCategory::Insect),
];

/// Conditions that rarely co-occur with the primary diagnosis.
static EXCLUSION_RULES: &[(&str, &[&str])] = &[
    ("fungal_leaf_spot", &["bacterial_spot", "mosaic_virus"]),
    ("bacterial_spot", &["fungal_leaf_spot", "mosaic_virus"]),
    ("mosaic_virus", &["bacterial_spot", "fungal_leaf_spot"]),
    ("powdery_mildew", &["fire_blight", "water_stress"]),
];

/// Static category lookup; unknown names are `Other`.
pub fn condition_category(name: &str) -> ConditionCategory {
    CONDITION_CATEGORIES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, category)| *category)
        .unwrap_or(ConditionCategory::Other)
}

/// Whether `primary` lists `other` as mutually exclusive.
pub fn excludes(primary: &str, other: &str) -> bool {
    EXCLUSION_RULES
        .iter()
        .find(|(key, _)| *key == primary)
        .is_some_and(|(_, excluded)| excluded.contains(&other))
}

/// Confidence factor for a secondary candidate given both categories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryAdjustment {
    pub factor: f64,
    pub possibly_secondary: bool,
}

pub fn category_adjustment(
    primary: ConditionCategory,
    secondary: ConditionCategory,
) -> CategoryAdjustment {
    use ConditionCategory::*;

    let (factor, possibly_secondary) = match (primary, secondary) {
        (p, s) if p == s && p.is_disease() => (SAME_CATEGORY_FACTOR, false),
        (_, Environmental | Nutritional) => (COFACTOR_FACTOR, false),
        (Fungal | Bacterial, Insect) => (PEST_SECONDARY_FACTOR, true),
        _ => (1.0, false),
    };
    CategoryAdjustment { factor, possibly_secondary }
}

// ============================================================================
// Matcher
// ============================================================================

pub struct ConditionMatcher<'a> {
    kb: &'a KnowledgeBase,
}

impl<'a> ConditionMatcher<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Ranked conditions (at most three, score-descending). Never empty.
    pub fn match_conditions(
        &self,
        symptoms: &[Symptom],
        plant_context: &str,
        analysis_text: &str,
    ) -> Vec<ScoredCondition> {
        if symptoms.iter().any(Symptom::is_healthy) {
            return vec![self.healthy_condition()];
        }

        let context = plant_context.to_lowercase();
        let text = analysis_text.to_lowercase();
        let names: Vec<&str> = symptoms.iter().map(|s| s.name.as_str()).collect();

        let mut candidates: Vec<ScoredCondition> = self
            .kb
            .search_by_symptoms(&names)
            .into_iter()
            .filter_map(|m| {
                let score = enhanced_score(m.record, symptoms, &context, Some(&text), m.score);
                (score > 0.0).then(|| ScoredCondition {
                    name: m.name.to_string(),
                    score,
                    matched_symptoms: matched_symptoms(m.record, symptoms),
                    record: Arc::clone(m.record),
                    confidence: (score / SCORE_SCALE).min(1.0),
                    category: condition_category(m.name),
                    role: None,
                    source: ConditionSource::DatabaseMatch,
                    note: None,
                })
            })
            .collect();
        sort_by_score(&mut candidates);

        // Names dropped by the hierarchy must not come back as plant-specific.
        let scored: FxHashSet<String> = candidates.iter().map(|c| c.name.clone()).collect();
        let mut ranked = apply_diagnostic_hierarchy(candidates);
        self.add_plant_specific(&mut ranked, &scored, symptoms, &context);

        if ranked.is_empty() {
            ranked.push(self.generic_condition(symptoms));
        }

        sort_by_score(&mut ranked);
        ranked.truncate(MAX_CONDITIONS);
        for (i, condition) in ranked.iter_mut().enumerate() {
            condition.role = Some(if i == 0 { ConditionRole::Primary } else { ConditionRole::Secondary });
        }

        tracing::debug!(
            "Ranked conditions: {:?}",
            ranked.iter().map(|c| (&c.name, c.score)).collect::<Vec<_>>()
        );
        ranked
    }

    /// Conditions common on the plants named in the context, scored without
    /// the full-text bonus. Only added when backed by a symptom and not
    /// already scored by the symptom search.
    fn add_plant_specific(
        &self,
        ranked: &mut Vec<ScoredCondition>,
        scored: &FxHashSet<String>,
        symptoms: &[Symptom],
        context: &str,
    ) {
        for word in context.split_whitespace() {
            let plant = word.trim_matches(|c: char| !c.is_alphanumeric());
            for (name, record) in self.kb.search_by_plant(plant) {
                if scored.contains(name) || ranked.iter().any(|c| c.name == name) {
                    continue;
                }
                let matched = matched_symptoms(record, symptoms);
                if matched.is_empty() {
                    continue;
                }
                let score = enhanced_score(record, symptoms, context, None, PLANT_SPECIFIC_BASE);
                if score <= 0.0 {
                    continue;
                }

                tracing::debug!("Plant-specific candidate '{}' for '{}'", name, plant);
                ranked.push(ScoredCondition {
                    name: name.to_string(),
                    score: score + PLANT_SPECIFIC_BONUS,
                    matched_symptoms: matched,
                    record: Arc::clone(record),
                    confidence: (score / PLANT_SPECIFIC_SCALE).min(1.0),
                    category: condition_category(name),
                    role: None,
                    source: ConditionSource::PlantSpecific,
                    note: None,
                });
            }
        }
    }

    fn healthy_condition(&self) -> ScoredCondition {
        let record = ConditionRecord {
            name: HEALTHY.to_string(),
            display_name: "Healthy Plant".to_string(),
            symptoms: vec![HEALTHY_PLANT.to_string()],
            description: "Plant appears healthy with no visible signs of disease or stress".to_string(),
            prevention: self.kb.advice(AdviceCategory::Preventive).to_vec(),
            ..Default::default()
        };

        ScoredCondition {
            name: HEALTHY.to_string(),
            score: HEALTHY_SCORE,
            matched_symptoms: vec![HEALTHY_PLANT.to_string()],
            record: Arc::new(record),
            confidence: HEALTHY_CONFIDENCE,
            category: ConditionCategory::Healthy,
            role: None,
            source: ConditionSource::HealthyAssessment,
            note: None,
        }
    }

    /// Broad condition synthesized from symptom names when no record scored.
    fn generic_condition(&self, symptoms: &[Symptom]) -> ScoredCondition {
        let (name, category) = if any_symptom(symptoms, |n| n.contains("infection")) {
            ("infection", ConditionCategory::Pathogenic)
        } else if any_symptom(symptoms, |n| n.contains("deficiency")) {
            ("nutrient_deficiency", ConditionCategory::Nutritional)
        } else if any_symptom(symptoms, |n| matches!(n, "browning" | "burning" | "wilting")) {
            ("environmental_stress", ConditionCategory::Environmental)
        } else {
            (GENERAL_STRESS, ConditionCategory::Other)
        };

        let symptom_names: Vec<String> = symptoms.iter().map(|s| s.name.clone()).collect();
        let record = ConditionRecord {
            name: name.to_string(),
            display_name: title_case(name),
            symptoms: symptom_names.clone(),
            description: format!(
                "General {} issue detected from visible symptoms",
                category.as_str()
            ),
            treatments: vec![TreatmentTemplate {
                kind: TreatmentType::General,
                action: "Monitor and adjust care".to_string(),
                details: self.kb.advice(AdviceCategory::Moderate).iter().take(3).cloned().collect(),
                products: Vec::new(),
            }],
            prevention: self.kb.advice(AdviceCategory::Preventive).iter().take(5).cloned().collect(),
            ..Default::default()
        };

        ScoredCondition {
            name: name.to_string(),
            score: GENERIC_SCORE,
            matched_symptoms: symptom_names,
            record: Arc::new(record),
            confidence: GENERIC_CONFIDENCE,
            category,
            role: None,
            source: ConditionSource::GenericFallback,
            note: None,
        }
    }
}

// ============================================================================
// Scoring helpers
// ============================================================================

/// Enhanced score for one record. `analysis_text` enables the full-text
/// keyword bonus.
pub fn enhanced_score(
    record: &ConditionRecord,
    symptoms: &[Symptom],
    plant_context: &str,
    analysis_text: Option<&str>,
    base: f64,
) -> f64 {
    let mut score = base;
    let mut specific = 0usize;
    let mut general = 0usize;

    for symptom in symptoms {
        if record.has_symptom(&symptom.name) {
            score += symptom.confidence * SPECIFIC_MATCH_WEIGHT;
            specific += 1;
        }

        let matched_text = symptom.text_match.to_lowercase();
        for keyword in &record.keywords {
            if matched_text.contains(&keyword.to_lowercase()) {
                score += symptom.confidence * GENERAL_MATCH_WEIGHT;
                general += 1;
            }
        }
    }

    if specific > 0 {
        score += SPECIFIC_MATCH_BONUS * specific as f64;
    } else if general > 0 {
        score *= GENERAL_ONLY_FACTOR;
    }

    if !plant_context.is_empty() {
        let named = record
            .common_plants
            .iter()
            .filter(|plant| plant_context.contains(&plant.to_lowercase()))
            .count();
        score += PLANT_CONTEXT_BONUS * named as f64;
    }

    if let Some(text) = analysis_text {
        let present = record
            .keywords
            .iter()
            .filter(|keyword| text.contains(&keyword.to_lowercase()))
            .count();
        score += (TEXT_KEYWORD_BONUS * present as f64).min(MAX_TEXT_KEYWORD_BONUS);
    }

    score.max(0.0)
}

/// Symptom names backing a record: identifier hits, or a keyword inside the
/// symptom's matched text (case-insensitive, as in `enhanced_score`).
fn matched_symptoms(record: &ConditionRecord, symptoms: &[Symptom]) -> Vec<String> {
    symptoms
        .iter()
        .filter(|symptom| {
            let matched_text = symptom.text_match.to_lowercase();
            record.has_symptom(&symptom.name)
                || record
                    .keywords
                    .iter()
                    .any(|k| matched_text.contains(&k.to_lowercase()))
        })
        .map(|symptom| symptom.name.clone())
        .collect()
}

fn any_symptom(symptoms: &[Symptom], pred: impl Fn(&str) -> bool) -> bool {
    symptoms.iter().any(|s| pred(&s.name))
}

fn sort_by_score(conditions: &mut [ScoredCondition]) {
    conditions.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
}

/// Dampen secondaries relative to the first (primary) candidate.
///
/// Input must be score-descending. Candidates whose adjusted confidence
/// falls to 0.25 or below are dropped; at most three survive.
pub fn apply_diagnostic_hierarchy(candidates: Vec<ScoredCondition>) -> Vec<ScoredCondition> {
    let mut candidates = candidates.into_iter();
    let Some(mut primary) = candidates.next() else {
        return Vec::new();
    };
    primary.role = Some(ConditionRole::Primary);
    let primary_name = primary.name.clone();
    let primary_category = primary.category;

    let mut ranked = vec![primary];
    for mut candidate in candidates {
        if ranked.len() >= MAX_CONDITIONS {
            break;
        }

        let mut adjusted = candidate.confidence;
        if excludes(&primary_name, &candidate.name) {
            adjusted *= EXCLUSION_FACTOR;
        }
        let adjustment = category_adjustment(primary_category, candidate.category);
        adjusted *= adjustment.factor;

        if adjusted <= MIN_SECONDARY_CONFIDENCE {
            tracing::debug!(
                "Dropping '{}' behind '{}' (adjusted confidence {:.2})",
                candidate.name,
                primary_name,
                adjusted
            );
            continue;
        }

        if adjustment.possibly_secondary {
            candidate.note = Some(POSSIBLY_SECONDARY_NOTE.to_string());
        }
        candidate.role = Some(ConditionRole::Secondary);
        candidate.confidence = adjusted;
        candidate.score *= adjusted;
        ranked.push(candidate);
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::extractor::SymptomExtractor;
    use crate::analyzer::patterns::{normalize_text, PatternLibrary};
    use crate::analyzer::types::SymptomSource;
    use approx::assert_relative_eq;

    fn scored(name: &str, score: f64, confidence: f64) -> ScoredCondition {
        ScoredCondition {
            name: name.to_string(),
            score,
            matched_symptoms: Vec::new(),
            record: Arc::new(ConditionRecord { name: name.to_string(), ..Default::default() }),
            confidence,
            category: condition_category(name),
            role: None,
            source: ConditionSource::DatabaseMatch,
            note: None,
        }
    }

    fn symptom(name: &str, text_match: &str, confidence: f64) -> Symptom {
        Symptom {
            name: name.to_string(),
            text_match: text_match.to_string(),
            confidence,
            source: SymptomSource::ConditionSymptom,
        }
    }

    fn rank(kb: &KnowledgeBase, text: &str, context: &str) -> Vec<ScoredCondition> {
        let library = PatternLibrary::from_knowledge_base(kb);
        let text = normalize_text(text);
        let symptoms = SymptomExtractor::new(&library).extract(&text);
        ConditionMatcher::new(kb).match_conditions(&symptoms, context, &text)
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(condition_category("powdery_mildew"), ConditionCategory::Fungal);
        assert_eq!(condition_category("fire_blight"), ConditionCategory::Bacterial);
        assert_eq!(condition_category("magnesium_deficiency"), ConditionCategory::Nutritional);
        assert_eq!(condition_category("unknown_thing"), ConditionCategory::Other);
    }

    #[test]
    fn test_category_adjustment_pairs() {
        use ConditionCategory::*;
        assert_relative_eq!(category_adjustment(Fungal, Fungal).factor, SAME_CATEGORY_FACTOR);
        assert_relative_eq!(category_adjustment(Fungal, Nutritional).factor, COFACTOR_FACTOR);
        assert_relative_eq!(category_adjustment(Insect, Insect).factor, 1.0);

        let pest = category_adjustment(Bacterial, Insect);
        assert_relative_eq!(pest.factor, PEST_SECONDARY_FACTOR);
        assert!(pest.possibly_secondary);
        assert!(!category_adjustment(Viral, Insect).possibly_secondary);
    }

    #[test]
    fn test_exclusion_dampens_to_at_most_thirty_percent() {
        let ranked = apply_diagnostic_hierarchy(vec![
            scored("fungal_leaf_spot", 12.0, 1.0),
            scored("bacterial_spot", 9.0, 0.9),
            scored("mosaic_virus", 7.0, 0.7),
        ]);

        assert_eq!(ranked[0].role, Some(ConditionRole::Primary));
        let bacterial = ranked.iter().find(|c| c.name == "bacterial_spot").unwrap();
        assert!(bacterial.confidence <= 0.3 * 0.9 + 1e-12);
        assert_eq!(bacterial.role, Some(ConditionRole::Secondary));
        assert_relative_eq!(bacterial.score, 9.0 * bacterial.confidence);

        // 0.7 × 0.3 = 0.21, below the cut-off
        assert!(ranked.iter().all(|c| c.name != "mosaic_virus"));
    }

    #[test]
    fn test_hierarchy_notes_pest_secondary_and_stops_at_three() {
        let ranked = apply_diagnostic_hierarchy(vec![
            scored("bacterial_spot", 12.0, 1.0),
            scored("aphid_infestation", 8.0, 0.8),
            scored("heat_stress", 7.0, 0.7),
            scored("scale_insects", 6.0, 0.6),
        ]);

        assert_eq!(ranked.len(), 3);
        let aphid = &ranked[1];
        assert_eq!(aphid.note.as_deref(), Some(POSSIBLY_SECONDARY_NOTE));
        assert_relative_eq!(aphid.confidence, 0.8 * PEST_SECONDARY_FACTOR);
        assert_relative_eq!(ranked[2].confidence, 0.7 * COFACTOR_FACTOR);
    }

    #[test]
    fn test_hierarchy_empty_input() {
        assert!(apply_diagnostic_hierarchy(Vec::new()).is_empty());
    }

    #[test]
    fn test_enhanced_score_general_only_penalty() {
        let kb = KnowledgeBase::builtin().unwrap();
        let record = kb.get("magnesium_deficiency").unwrap();
        let symptoms = vec![symptom("older_leaves", "older leaves", 0.9)];

        // base 1 + 0.9 × 1.5 = 2.35, general-only × 0.7
        let score = enhanced_score(record, &symptoms, "", None, 1.0);
        assert_relative_eq!(score, 2.35 * 0.7, epsilon = 1e-9);

        let with_plant = enhanced_score(record, &symptoms, "tomato", None, 1.0);
        assert_relative_eq!(with_plant - score, PLANT_CONTEXT_BONUS, epsilon = 1e-9);
    }

    #[test]
    fn test_fungal_description_scores_leaf_spot_first() {
        let kb = KnowledgeBase::builtin().unwrap();
        let ranked = rank(
            &kb,
            "The plant shows clear signs of fungal infection with brown circular spots on the leaves, spreading rapidly across many leaves.",
            "",
        );

        let primary = &ranked[0];
        assert_eq!(primary.name, "fungal_leaf_spot");
        assert_eq!(primary.role, Some(ConditionRole::Primary));
        assert_relative_eq!(primary.score, 14.8, epsilon = 1e-9);
        assert_relative_eq!(primary.confidence, 1.0);

        assert!(ranked.len() <= MAX_CONDITIONS);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_healthy_is_exclusive() {
        let kb = KnowledgeBase::builtin().unwrap();
        let matcher = ConditionMatcher::new(&kb);
        let symptoms = vec![
            Symptom {
                name: HEALTHY_PLANT.to_string(),
                text_match: "looks healthy".to_string(),
                confidence: 0.9,
                source: SymptomSource::DirectObservation,
            },
            symptom("spots", "spots", 0.8),
        ];

        let ranked = matcher.match_conditions(&symptoms, "tomato", "looks healthy");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].category, ConditionCategory::Healthy);
        assert_relative_eq!(ranked[0].confidence, 0.9);
        assert!(!ranked[0].record.prevention.is_empty());
    }

    #[test]
    fn test_generic_fallback_when_nothing_scores() {
        let kb = KnowledgeBase::builtin().unwrap();
        let matcher = ConditionMatcher::new(&kb);
        let symptoms = vec![symptom(GENERAL_STRESS, "problem", 0.5)];

        let ranked = matcher.match_conditions(&symptoms, "", "there may be a problem");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, GENERAL_STRESS);
        assert_eq!(ranked[0].category, ConditionCategory::Other);
        assert_eq!(ranked[0].source, ConditionSource::GenericFallback);
        assert_relative_eq!(ranked[0].score, 5.0);
        assert_relative_eq!(ranked[0].confidence, 0.4);
    }

    const PLANT_KB: &str = r#"{
      "conditions": {
        "leaf_curl": {
          "name": "Leaf Curl",
          "symptoms": ["curling"],
          "keywords": ["curl"]
        },
        "mite_webbing": {
          "name": "Mite Webbing",
          "symptoms": ["webbing"],
          "keywords": ["fine web"],
          "common_plants": ["Basil"]
        }
      }
    }"#;

    fn curling_with_web() -> Vec<Symptom> {
        vec![symptom("curling", "curled leaves with Fine Web", 0.8)]
    }

    #[test]
    fn test_matched_symptoms_use_matched_text() {
        let kb = KnowledgeBase::from_json_str(PLANT_KB).unwrap();
        let symptoms = curling_with_web();

        let mites = kb.get("mite_webbing").unwrap();
        assert_eq!(matched_symptoms(mites, &symptoms), vec!["curling".to_string()]);

        let unrelated = vec![symptom("curling", "twisted leaves", 0.8)];
        assert!(matched_symptoms(mites, &unrelated).is_empty());
    }

    #[test]
    fn test_plant_specific_candidate() {
        let kb = KnowledgeBase::from_json_str(PLANT_KB).unwrap();
        let symptoms = curling_with_web();
        let matcher = ConditionMatcher::new(&kb);

        let ranked = matcher.match_conditions(&symptoms, "basil", "curled leaves with fine web");
        assert_eq!(ranked[0].name, "leaf_curl");
        assert_eq!(ranked[0].source, ConditionSource::DatabaseMatch);

        let mites = ranked.iter().find(|c| c.name == "mite_webbing").unwrap();
        assert_eq!(mites.source, ConditionSource::PlantSpecific);
        assert_eq!(mites.role, Some(ConditionRole::Secondary));
        assert_eq!(mites.matched_symptoms, vec!["curling".to_string()]);

        // base 1 + 0.8 × 1.5 = 2.2, general-only × 0.7, + 1 for basil
        let base = enhanced_score(kb.get("mite_webbing").unwrap(), &symptoms, "basil", None, 1.0);
        assert_relative_eq!(base, 2.2 * 0.7 + 1.0, epsilon = 1e-9);
        assert_relative_eq!(mites.score, base + PLANT_SPECIFIC_BONUS, epsilon = 1e-9);
        assert_relative_eq!(mites.confidence, base / PLANT_SPECIFIC_SCALE, epsilon = 1e-9);

        let without_plant = matcher.match_conditions(&symptoms, "", "curled leaves with fine web");
        assert!(without_plant.iter().all(|c| c.name != "mite_webbing"));
    }

    #[test]
    fn test_plant_context_keeps_excluded_condition_dampened() {
        let kb = KnowledgeBase::builtin().unwrap();
        let text = "Leaves have brown spots on them.";

        let without = rank(&kb, text, "");
        let with_tomato = rank(&kb, text, "tomato");
        assert_eq!(without[0].name, "fungal_leaf_spot");
        assert_eq!(with_tomato[0].name, "fungal_leaf_spot");

        if let Some(bacterial) = with_tomato.iter().find(|c| c.name == "bacterial_spot") {
            assert_eq!(bacterial.source, ConditionSource::DatabaseMatch);
            assert!(bacterial.confidence <= EXCLUSION_FACTOR + 1e-9);
        }
    }

    #[test]
    fn test_plant_context_adds_bonus() {
        let kb = KnowledgeBase::builtin().unwrap();
        let text = "The plant displays yellowing of older leaves starting from the tips.";

        let with_tomato = rank(&kb, text, "tomato");
        let without = rank(&kb, text, "");

        assert_eq!(with_tomato[0].name, "magnesium_deficiency");
        assert_eq!(without[0].name, "magnesium_deficiency");
        assert_relative_eq!(with_tomato[0].score - without[0].score, 1.0, epsilon = 1e-9);

        assert!(with_tomato
            .iter()
            .skip(1)
            .all(|c| c.role == Some(ConditionRole::Secondary)));
    }
}
