//! Severity & Confidence Assessment
//!
//! Initial severity comes from wording in the analysis text, then from the
//! treatments of any condition named outright, then from the symptom count.
//! It is reconciled with the primary condition's confidence once ranking is
//! done.

use crate::knowledge_base::{KnowledgeBase, TreatmentType};

use super::patterns::{is_negated, NEGATION_WINDOW};
use super::types::{ConfidenceTier, ScoredCondition, Severity, Symptom, SymptomSource};

/// Keyword cues, checked in priority order.
static SEVERITY_KEYWORDS: &[(Severity, &[&str])] = &[
    (
        Severity::Critical,
        &["dying", "dead", "severe", "extensive", "widespread", "covering most", "emergency"],
    ),
    (
        Severity::High,
        &["spreading rapidly", "many leaves", "progressing", "getting worse", "significant", "urgent"],
    ),
    (
        Severity::Moderate,
        &["several leaves", "noticeable", "some spread", "moderate", "multiple"],
    ),
    (
        Severity::Mild,
        &["few leaves", "early stage", "beginning", "slight", "minor", "starting"],
    ),
];

const MODERATE_SYMPTOM_COUNT: usize = 3;

const LOW_CONFIDENCE: f64 = 0.4;
const UNCERTAIN_CONFIDENCE: f64 = 0.6;

/// Severity before condition matching.
pub fn assess_initial_severity(text: &str, symptoms: &[Symptom], kb: &KnowledgeBase) -> Severity {
    if symptoms.iter().any(Symptom::is_healthy) {
        return Severity::None;
    }

    let lower = text.to_lowercase();
    for (severity, keywords) in SEVERITY_KEYWORDS {
        if let Some(keyword) = keywords.iter().find(|k| mentions(&lower, k)) {
            tracing::debug!("Severity {} from '{}'", severity.as_str(), keyword);
            return *severity;
        }
    }

    let named_conditions = symptoms
        .iter()
        .filter(|s| s.source == SymptomSource::ConditionName)
        .filter_map(|s| kb.get(&s.name));
    let mut severity_from_treatment = None;
    for record in named_conditions {
        if record.has_treatment(&[TreatmentType::Emergency]) {
            return Severity::Critical;
        }
        if record.has_treatment(&[TreatmentType::Removal, TreatmentType::Antibiotic]) {
            severity_from_treatment = Some(Severity::High);
        }
    }
    if let Some(severity) = severity_from_treatment {
        return severity;
    }

    match symptoms.len() {
        0 => Severity::None,
        n if n >= MODERATE_SYMPTOM_COUNT => Severity::Moderate,
        _ => Severity::Mild,
    }
}

/// Non-negated occurrence of a keyword ("not severe" does not count).
fn mentions(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword)
        .any(|(start, _)| !is_negated(text, start, NEGATION_WINDOW))
}

/// Soften severity when the diagnosis itself is uncertain.
pub fn reconcile_severity(severity: Severity, primary_confidence: f64) -> Severity {
    if primary_confidence < LOW_CONFIDENCE {
        severity.downgrade()
    } else if primary_confidence < UNCERTAIN_CONFIDENCE {
        match severity {
            Severity::Critical => Severity::High,
            Severity::High => Severity::Moderate,
            other => other,
        }
    } else {
        severity
    }
}

/// Overall tier from the primary condition's confidence.
pub fn confidence_tier(symptoms: &[Symptom], conditions: &[ScoredCondition]) -> ConfidenceTier {
    if symptoms.is_empty() {
        return ConfidenceTier::Low;
    }
    conditions
        .first()
        .map(|primary| ConfidenceTier::from_confidence(primary.confidence))
        .unwrap_or(ConfidenceTier::Low)
}
