//! Plant Health Analyzer
//!
//! Turns free-text vision-model output into a [`DiagnosisResult`].
//!
//! Pipeline for one request:
//! 1. Normalize text (strip generator scaffolding, collapse whitespace)
//! 2. Extract symptoms ([`extractor`])
//! 3. Initial severity from wording and symptoms ([`assessor`])
//! 4. Rank conditions against the knowledge base ([`matcher`])
//! 5. Reconcile severity with the primary confidence
//! 6. Compose treatments, actions, prevention tips and summary ([`composer`])
//!
//! The analyzer holds only immutable state (knowledge base, compiled
//! patterns, config) and is `Send + Sync`; every request builds its own
//! structures.

pub mod assessor;
pub mod composer;
pub mod config;
pub mod extractor;
pub mod matcher;
pub mod patterns;
pub mod types;

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;
use crate::knowledge_base::{AdviceCategory, ConditionRecord, KnowledgeBase, TreatmentTemplate, TreatmentType, Urgency};
use crate::utils::title_case;

use assessor::{assess_initial_severity, confidence_tier, reconcile_severity};
use composer::{RecommendationComposer, FALLBACK_ACTIONS};
use extractor::SymptomExtractor;
use matcher::ConditionMatcher;
use patterns::{normalize_text, PatternLibrary};

pub use config::AnalyzerConfig;
pub use types::{
    ConditionCategory, ConditionRole, ConditionSource, ConfidenceBand, ConfidenceTier,
    DiagnosisResult, ScoredCondition, Severity, Symptom, SymptomSource, Treatment, TreatmentSource,
    ANALYSIS_INCOMPLETE,
};

/// Inputs shorter than this (after normalization) get the fallback result.
const MIN_ANALYSIS_CHARS: usize = 10;

const FALLBACK_SCORE: f64 = 3.0;
const FALLBACK_CONFIDENCE: f64 = 0.3;
const FALLBACK_DESCRIPTION: &str =
    "Unable to complete analysis. Please try with a clearer image or consult an expert.";

/// One request for [`PlantHealthAnalyzer::process_batch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub raw_text: String,
    #[serde(default = "default_analysis_mode")]
    pub analysis_mode: String,
    #[serde(default)]
    pub plant_context: String,
}

fn default_analysis_mode() -> String {
    "comprehensive".to_string()
}

pub struct PlantHealthAnalyzer {
    kb: Arc<KnowledgeBase>,
    patterns: PatternLibrary,
    config: AnalyzerConfig,
}

impl PlantHealthAnalyzer {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self::with_config(kb, AnalyzerConfig::default())
    }

    pub fn with_config(kb: Arc<KnowledgeBase>, config: AnalyzerConfig) -> Self {
        let patterns = PatternLibrary::from_knowledge_base(&kb);
        tracing::info!(
            "Analyzer ready: {} conditions, {} symptom patterns",
            kb.len(),
            patterns.len()
        );
        Self { kb, patterns, config }
    }

    /// Analyzer over the built-in knowledge base.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(KnowledgeBase::builtin()?)))
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one text. Never fails: errors become the fallback result
    /// with `error` set.
    pub fn process_analysis(
        &self,
        raw_text: &str,
        analysis_mode: &str,
        plant_context: &str,
    ) -> DiagnosisResult {
        match self.try_process(raw_text, analysis_mode, plant_context) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Analysis failed, returning fallback: {}", e);
                self.fallback_result(raw_text, analysis_mode, Some(e.to_string()))
            }
        }
    }

    pub fn try_process(
        &self,
        raw_text: &str,
        analysis_mode: &str,
        plant_context: &str,
    ) -> Result<DiagnosisResult, AnalyzerError> {
        let text = normalize_text(raw_text);
        if text.chars().count() < MIN_ANALYSIS_CHARS {
            tracing::warn!("Analysis text too short ({} chars), using fallback", text.len());
            return Ok(self.fallback_result(raw_text, analysis_mode, None));
        }

        tracing::info!("Processing {} analysis ({} chars)", analysis_mode, text.len());

        let symptoms = SymptomExtractor::new(&self.patterns).extract(&text);
        let initial_severity = assess_initial_severity(&text, &symptoms, &self.kb);

        let conditions =
            ConditionMatcher::new(&self.kb).match_conditions(&symptoms, plant_context, &text);
        let primary = conditions.first().ok_or(AnalyzerError::NoConditions)?;
        if !primary.confidence.is_finite() {
            return Err(AnalyzerError::InvalidConfidence(primary.confidence));
        }

        let severity = reconcile_severity(initial_severity, primary.confidence);
        if severity != initial_severity {
            tracing::info!(
                "Adjusted severity {} -> {} (confidence {:.2})",
                initial_severity.as_str(),
                severity.as_str(),
                primary.confidence
            );
        }

        let composer = RecommendationComposer::new(&self.kb, self.config.season());
        let treatments = composer.treatments(&conditions, severity);
        let immediate_actions = composer.immediate_actions(&symptoms, severity, &conditions);
        let prevention_tips = composer.prevention_tips(&conditions);
        let recommendation =
            composer.recommendation_text(&conditions, &treatments, &immediate_actions, severity);
        let confidence = confidence_tier(&symptoms, &conditions);

        tracing::info!(
            "Diagnosis: {} ({} confidence, {} severity, {} symptoms)",
            primary.name,
            confidence.as_str(),
            severity.as_str(),
            symptoms.len()
        );

        Ok(DiagnosisResult {
            raw_text: raw_text.to_string(),
            symptoms,
            severity,
            conditions,
            treatments,
            immediate_actions,
            prevention_tips,
            confidence,
            analysis_type: analysis_mode.to_string(),
            recommendation,
            error: None,
        })
    }

    /// Analyze independent requests in parallel.
    pub fn process_batch(&self, requests: &[AnalysisRequest]) -> Vec<DiagnosisResult> {
        tracing::info!("Processing batch of {} analyses", requests.len());
        requests
            .par_iter()
            .map(|r| self.process_analysis(&r.raw_text, &r.analysis_mode, &r.plant_context))
            .collect()
    }

    /// Result for degenerate input or a failed analysis.
    pub fn fallback_result(
        &self,
        raw_text: &str,
        analysis_mode: &str,
        error: Option<String>,
    ) -> DiagnosisResult {
        let moderate: Vec<String> =
            self.kb.advice(AdviceCategory::Moderate).iter().take(3).cloned().collect();
        let preventive: Vec<String> =
            self.kb.advice(AdviceCategory::Preventive).iter().take(5).cloned().collect();

        let record = ConditionRecord {
            name: ANALYSIS_INCOMPLETE.to_string(),
            display_name: title_case(ANALYSIS_INCOMPLETE),
            description: FALLBACK_DESCRIPTION.to_string(),
            treatments: vec![TreatmentTemplate {
                kind: TreatmentType::General,
                action: "Monitor plant closely".to_string(),
                details: moderate.clone(),
                products: Vec::new(),
            }],
            prevention: preventive.clone(),
            ..Default::default()
        };

        let placeholder = ScoredCondition {
            name: ANALYSIS_INCOMPLETE.to_string(),
            score: FALLBACK_SCORE,
            matched_symptoms: Vec::new(),
            record: Arc::new(record),
            confidence: FALLBACK_CONFIDENCE,
            category: ConditionCategory::Unknown,
            role: Some(ConditionRole::Primary),
            source: ConditionSource::Fallback,
            note: None,
        };

        let raw_text = if raw_text.trim().is_empty() {
            "No analysis available".to_string()
        } else {
            raw_text.to_string()
        };

        DiagnosisResult {
            raw_text,
            symptoms: Vec::new(),
            severity: Severity::Unknown,
            conditions: vec![placeholder],
            treatments: vec![Treatment {
                kind: TreatmentType::GeneralCare,
                action: "Provide basic plant care".to_string(),
                details: moderate,
                products: Vec::new(),
                urgency: Urgency::Medium,
                condition: None,
                source: TreatmentSource::GeneralAdvice,
            }],
            immediate_actions: FALLBACK_ACTIONS.iter().map(|a| a.to_string()).collect(),
            prevention_tips: preventive,
            confidence: ConfidenceTier::Low,
            analysis_type: analysis_mode.to_string(),
            recommendation: format!(
                "**Analysis Type**: {}\n**Status**: Analysis incomplete\n**Recommendation**: Follow general care guidelines and monitor closely",
                title_case(analysis_mode)
            ),
            error,
        }
    }
}
