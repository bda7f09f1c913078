//! Diagnosis Presentation
//!
//! Text helpers that render a [`DiagnosisResult`] for people: badges,
//! one-line summaries, symptom and treatment lists, timelines, checklists
//! and the full markdown report (see [`markdown`]).

pub mod markdown;

pub use markdown::format_diagnosis_report;

use crate::analyzer::{ConditionCategory, ConfidenceTier, DiagnosisResult, Severity, Symptom, Treatment};
use crate::knowledge_base::Urgency;
use crate::utils::{percent, title_case};

pub fn severity_badge(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴 CRITICAL",
        Severity::High => "🟠 HIGH",
        Severity::Moderate => "🟡 MODERATE",
        Severity::Mild => "🟢 MILD",
        Severity::None => "🌱 HEALTHY",
        Severity::Unknown => "⚪ UNKNOWN",
    }
}

pub fn confidence_indicator(confidence: ConfidenceTier) -> &'static str {
    match confidence {
        ConfidenceTier::High => "🎯 High Confidence",
        ConfidenceTier::Medium => "🎲 Medium Confidence",
        ConfidenceTier::Moderate => "🎲 Moderate Confidence",
        ConfidenceTier::Low => "❓ Low Confidence",
    }
}

/// How far to trust the diagnosis, given its severity.
pub fn confidence_recommendation(confidence: ConfidenceTier, severity: Severity) -> &'static str {
    if severity == Severity::None {
        return match confidence {
            ConfidenceTier::High => {
                "High confidence that your plant is healthy! Continue your excellent care routine."
            }
            ConfidenceTier::Medium => {
                "Plant appears healthy. Keep monitoring and maintain current care practices."
            }
            _ => "Plant seems okay, but consider getting a second opinion if you notice any changes.",
        };
    }

    match (confidence, severity) {
        (ConfidenceTier::High, Severity::Mild | Severity::Moderate) => {
            "Diagnosis appears reliable. Follow treatment recommendations and monitor progress."
        }
        (ConfidenceTier::High, Severity::High | Severity::Critical) => {
            "High confidence diagnosis of serious issue. Take immediate action and consider professional consultation."
        }
        (ConfidenceTier::Medium | ConfidenceTier::Moderate, _) => {
            "Moderate confidence in diagnosis. Try recommended treatments and monitor closely. Consider getting a second opinion."
        }
        _ => {
            "Low confidence diagnosis. Consider consulting a local plant expert or extension service for professional advice."
        }
    }
}

/// One-line summary of the result.
pub fn diagnosis_summary(result: &DiagnosisResult) -> String {
    let confidence = result.confidence.as_str();
    if result.severity == Severity::None || result.is_healthy() {
        return format!(
            "🌱 HEALTHY - Plant appears to be in excellent condition ({} confidence)",
            confidence
        );
    }

    match result.primary() {
        Some(primary) => format!(
            "{} - Likely {} ({} confidence)",
            severity_badge(result.severity),
            primary.display_name(),
            confidence
        ),
        None => format!(
            "{} - General plant stress detected ({} confidence)",
            severity_badge(result.severity),
            confidence
        ),
    }
}

pub fn format_symptoms_list(symptoms: &[Symptom]) -> String {
    if symptoms.is_empty() {
        return "No specific symptoms detected.".to_string();
    }
    symptoms
        .iter()
        .map(|s| format!("• {} ({} confidence)", title_case(&s.name), percent(s.confidence)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_treatments_text(treatments: &[Treatment]) -> String {
    if treatments.is_empty() {
        return "No specific treatments recommended.".to_string();
    }

    let mut lines = Vec::new();
    for (i, treatment) in treatments.iter().enumerate() {
        lines.push(format!(
            "{}. **{}** ({} priority)",
            i + 1,
            treatment.action,
            treatment.urgency.as_str()
        ));
        lines.extend(treatment.details.iter().map(|d| format!("   - {}", d)));
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}

/// Tips that do not already open with an emoji get a bullet.
pub fn format_prevention_tips(tips: &[String]) -> String {
    if tips.is_empty() {
        return "No specific prevention tips available.".to_string();
    }
    tips.iter()
        .map(|tip| {
            if tip.chars().next().is_some_and(|c| c.is_alphanumeric()) {
                format!("• {}", tip)
            } else {
                tip.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split treatments into immediate (high or emergency urgency) and ongoing.
pub fn treatment_timeline(treatments: &[Treatment]) -> String {
    if treatments.is_empty() {
        return "No treatment timeline available.".to_string();
    }

    let (immediate, ongoing): (Vec<&Treatment>, Vec<&Treatment>) =
        treatments.iter().partition(|t| t.urgency >= Urgency::High);

    let mut lines = vec!["📅 **Treatment Timeline:**".to_string(), String::new()];
    if !immediate.is_empty() {
        lines.push("**Immediate (within 24 hours):**".to_string());
        lines.extend(immediate.iter().map(|t| format!("• {}", t.action)));
        lines.push(String::new());
    }
    if !ongoing.is_empty() {
        lines.push("**Ongoing treatment:**".to_string());
        lines.extend(ongoing.iter().map(|t| format!("• {}", t.action)));
        lines.push(String::new());
    }
    lines.push("📋 **Follow-up:** Monitor progress and repeat treatments as recommended".to_string());
    lines.join("\n")
}

/// Daily checklist keyed by the detected symptoms and severity.
pub fn care_checklist(result: &DiagnosisResult) -> String {
    let mut items = vec![
        "□ Check soil moisture level",
        "□ Inspect leaves for changes",
        "□ Remove any new affected plant material",
        "□ Monitor environmental conditions",
    ];

    let has = |names: &[&str]| result.symptoms.iter().any(|s| names.iter().any(|n| *n == s.name));
    if has(&["wilting"]) {
        items.push("□ Adjust watering schedule");
    }
    if has(&["spots", "browning", "blackening"]) {
        items.push("□ Apply fungicide treatment");
        items.push("□ Clean up fallen debris");
    }
    if has(&["yellowing"]) {
        items.push("□ Check fertilizer needs");
    }
    if matches!(result.severity, Severity::High | Severity::Critical) {
        items.push("□ Take photos to track progress");
        items.push("□ Consider professional consultation");
    }

    format!("**Daily Care Checklist:**\n{}", items.join("\n"))
}

/// Category-level recovery estimate for when a record has no recovery table.
pub fn estimate_recovery_time(severity: Severity, category: ConditionCategory) -> &'static str {
    use ConditionCategory::*;

    let times: [&'static str; 4] = match category {
        Fungal => ["1-2 weeks", "2-4 weeks", "4-8 weeks", "8+ weeks"],
        Bacterial | Pathogenic => ["2-3 weeks", "3-6 weeks", "6-12 weeks", "12+ weeks"],
        Nutritional => ["1-2 weeks", "2-3 weeks", "3-4 weeks", "4+ weeks"],
        Insect => ["1 week", "2-3 weeks", "3-6 weeks", "6+ weeks"],
        Viral => return "no cure - remove infected plants",
        Environmental | Other | Unknown | Healthy => ["few days", "1-2 weeks", "2-4 weeks", "4+ weeks"],
    };

    match severity {
        Severity::Mild => times[0],
        Severity::Moderate => times[1],
        Severity::High => times[2],
        Severity::Critical => times[3],
        Severity::None | Severity::Unknown => "timeframe varies",
    }
}

/// Step-by-step protocol for high and critical cases.
pub fn emergency_response(severity: Severity, condition: &str, category: ConditionCategory) -> String {
    if !matches!(severity, Severity::High | Severity::Critical) {
        return "No emergency response needed for this severity level.".to_string();
    }

    let steps: &[&str] = match (condition, category) {
        ("fire_blight", _) => &[
            "🚨 STOP all watering immediately",
            "✂️ Prune infected branches 12+ inches below symptoms",
            "🧴 Disinfect tools with 70% alcohol between each cut",
            "🔥 Burn or bag all infected material - DO NOT COMPOST",
            "📱 Contact extension service for professional guidance",
        ],
        ("crown_gall", _) => &[
            "🚨 Remove entire plant including all roots",
            "🚫 Do not replant susceptible species in same location for 3-4 years",
            "🧹 Sterilize soil if possible",
            "🧴 Disinfect all tools thoroughly",
        ],
        (_, ConditionCategory::Viral) => &[
            "🚨 Isolate plant immediately from other plants",
            "🦠 Control insect vectors (aphids, whiteflies) aggressively",
            "✂️ Remove infected plant entirely",
            "🧴 Disinfect tools with 10% bleach solution",
        ],
        _ => &[
            "🚨 Take immediate action to prevent spread",
            "✂️ Remove all affected plant material",
            "🧹 Clean up area thoroughly",
            "📱 Consider professional consultation",
            "📸 Document progression with photos",
        ],
    };

    let numbered: Vec<String> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect();
    format!("**EMERGENCY RESPONSE PROTOCOL:**\n{}", numbered.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{SymptomSource, TreatmentSource};
    use crate::knowledge_base::TreatmentType;

    fn treatment(action: &str, urgency: Urgency) -> Treatment {
        Treatment {
            kind: TreatmentType::Fungicide,
            action: action.to_string(),
            details: vec!["Spray weekly".to_string()],
            products: Vec::new(),
            urgency,
            condition: None,
            source: TreatmentSource::Database,
        }
    }

    #[test]
    fn test_badges() {
        assert_eq!(severity_badge(Severity::Critical), "🔴 CRITICAL");
        assert_eq!(severity_badge(Severity::None), "🌱 HEALTHY");
        assert_eq!(confidence_indicator(ConfidenceTier::Low), "❓ Low Confidence");
    }

    #[test]
    fn test_confidence_recommendation() {
        assert!(confidence_recommendation(ConfidenceTier::High, Severity::None).starts_with("High confidence that"));
        assert!(confidence_recommendation(ConfidenceTier::High, Severity::Critical).contains("serious issue"));
        assert!(confidence_recommendation(ConfidenceTier::Low, Severity::Mild).starts_with("Low confidence"));
    }

    #[test]
    fn test_symptom_and_treatment_lists() {
        let symptoms = vec![Symptom {
            name: "circular_lesions".to_string(),
            text_match: "circular lesions".to_string(),
            confidence: 0.9,
            source: SymptomSource::ConditionSymptom,
        }];
        assert_eq!(format_symptoms_list(&symptoms), "• Circular Lesions (90% confidence)");
        assert_eq!(format_symptoms_list(&[]), "No specific symptoms detected.");

        let text = format_treatments_text(&[treatment("Apply fungicide", Urgency::High)]);
        assert_eq!(text, "1. **Apply fungicide** (high priority)\n   - Spray weekly");
    }

    #[test]
    fn test_prevention_tip_bullets() {
        let tips = vec!["💧 Water early".to_string(), "Rotate crops".to_string()];
        assert_eq!(format_prevention_tips(&tips), "💧 Water early\n• Rotate crops");
    }

    #[test]
    fn test_timeline_groups_by_urgency() {
        let timeline = treatment_timeline(&[
            treatment("Remove infected leaves", Urgency::Emergency),
            treatment("Mulch the bed", Urgency::Low),
        ]);
        let immediate = timeline.find("Immediate").unwrap();
        let remove = timeline.find("Remove infected leaves").unwrap();
        let ongoing = timeline.find("Ongoing").unwrap();
        let mulch = timeline.find("Mulch the bed").unwrap();
        assert!(immediate < remove && remove < ongoing && ongoing < mulch);
    }

    #[test]
    fn test_estimate_recovery_time() {
        assert_eq!(estimate_recovery_time(Severity::Moderate, ConditionCategory::Fungal), "2-4 weeks");
        assert_eq!(estimate_recovery_time(Severity::Critical, ConditionCategory::Insect), "6+ weeks");
        assert_eq!(estimate_recovery_time(Severity::None, ConditionCategory::Fungal), "timeframe varies");
    }

    #[test]
    fn test_emergency_response() {
        let text = emergency_response(Severity::Critical, "fire_blight", ConditionCategory::Bacterial);
        assert!(text.contains("1. 🚨 STOP all watering immediately"));
        let text = emergency_response(Severity::High, "mosaic_virus", ConditionCategory::Viral);
        assert!(text.contains("Isolate plant"));
        assert!(emergency_response(Severity::Mild, "fire_blight", ConditionCategory::Bacterial)
            .starts_with("No emergency response"));
    }
}
