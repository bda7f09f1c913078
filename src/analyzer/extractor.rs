//! Symptom Extraction
//!
//! Runs the pattern library over normalized analysis text and returns the
//! deduplicated symptom list, highest confidence first.
//!
//! Order of checks:
//! 1. Explicit healthy phrasing with no definitive problem word wins outright.
//! 2. Every pattern runs; negated matches are dropped.
//! 3. Duplicates collapse to their highest-confidence instance.
//! 4. An empty result falls back to an implicit-stress or default-healthy
//!    symptom.

use rustc_hash::FxHashMap;

use super::patterns::{
    healthy_phrase, has_definitive_problem, implicit_problem, is_negated, symptom_confidence,
    PatternLibrary, NEGATION_WINDOW,
};
use super::types::{Symptom, SymptomSource, GENERAL_STRESS, HEALTHY_PLANT};

/// Texts shorter than this carry no usable signal.
const MIN_TEXT_CHARS: usize = 5;
/// Texts longer than this get an implicit/default symptom when nothing matched.
const FALLBACK_TEXT_CHARS: usize = 10;

const EXPLICIT_HEALTHY_CONFIDENCE: f64 = 0.9;
const IMPLICIT_STRESS_CONFIDENCE: f64 = 0.5;
const DEFAULT_HEALTHY_CONFIDENCE: f64 = 0.6;

pub struct SymptomExtractor<'a> {
    patterns: &'a PatternLibrary,
}

impl<'a> SymptomExtractor<'a> {
    pub fn new(patterns: &'a PatternLibrary) -> Self {
        Self { patterns }
    }

    pub fn extract(&self, text: &str) -> Vec<Symptom> {
        let text = text.trim();
        let char_count = text.chars().count();
        if char_count < MIN_TEXT_CHARS {
            return Vec::new();
        }

        let lower = text.to_lowercase();

        if let Some(phrase) = healthy_phrase(&lower) {
            if !has_definitive_problem(&lower) {
                tracing::debug!("Explicit healthy phrasing: '{}'", phrase);
                return vec![Symptom {
                    name: HEALTHY_PLANT.to_string(),
                    text_match: phrase.to_string(),
                    confidence: EXPLICIT_HEALTHY_CONFIDENCE,
                    source: SymptomSource::DirectObservation,
                }];
            }
        }

        let mut found: FxHashMap<String, Symptom> = FxHashMap::default();
        for pattern in self.patterns.iter() {
            for m in pattern.regex.find_iter(&lower) {
                if is_negated(&lower, m.start(), NEGATION_WINDOW) {
                    tracing::debug!("Negated mention of '{}' skipped", pattern.name);
                    continue;
                }

                let confidence = symptom_confidence(m.as_str(), pattern.condition_linked);
                let keep_existing = found
                    .get(&pattern.name)
                    .is_some_and(|existing| existing.confidence >= confidence);
                if !keep_existing {
                    found.insert(
                        pattern.name.clone(),
                        Symptom {
                            name: pattern.name.clone(),
                            text_match: m.as_str().to_string(),
                            confidence,
                            source: pattern.source,
                        },
                    );
                }
            }
        }

        let mut symptoms: Vec<Symptom> = found.into_values().collect();

        if symptoms.is_empty() && char_count > FALLBACK_TEXT_CHARS {
            let fallback = match implicit_problem(&lower) {
                Some(cue) => Symptom {
                    name: GENERAL_STRESS.to_string(),
                    text_match: cue.to_string(),
                    confidence: IMPLICIT_STRESS_CONFIDENCE,
                    source: SymptomSource::ImplicitDetection,
                },
                None => Symptom {
                    name: HEALTHY_PLANT.to_string(),
                    text_match: String::new(),
                    confidence: DEFAULT_HEALTHY_CONFIDENCE,
                    source: SymptomSource::DefaultAssessment,
                },
            };
            symptoms.push(fallback);
        }

        symptoms.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.name.cmp(&b.name))
        });

        tracing::debug!("Extracted {} symptoms", symptoms.len());
        symptoms
    }
}
