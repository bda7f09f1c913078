//! Markdown diagnosis report.

use std::fmt::Write;

use crate::analyzer::composer::recovery_stage;
use crate::analyzer::{DiagnosisResult, ScoredCondition, Severity};
use crate::utils::percent;

use super::{
    care_checklist, confidence_indicator, confidence_recommendation, diagnosis_summary,
    emergency_response, estimate_recovery_time, format_prevention_tips, format_symptoms_list,
    format_treatments_text, severity_badge, treatment_timeline,
};

/// Full report: summary, conditions, symptoms, treatments, timeline,
/// actions, prevention and a care checklist.
pub fn format_diagnosis_report(result: &DiagnosisResult) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, result)?;
    Ok(out)
}

fn write_report(out: &mut String, result: &DiagnosisResult) -> std::fmt::Result {
    writeln!(out, "# 🌿 Plant Health Diagnosis")?;
    writeln!(out)?;
    writeln!(out, "{}", diagnosis_summary(result))?;
    writeln!(out)?;
    writeln!(
        out,
        "**Severity**: {} ({})",
        severity_badge(result.severity),
        result.severity.description()
    )?;
    writeln!(out, "**Confidence**: {}", confidence_indicator(result.confidence))?;
    writeln!(out, "**Analysis Type**: {}", result.analysis_type)?;
    if let Some(error) = &result.error {
        writeln!(out, "**Error**: {}", error)?;
    }
    writeln!(out)?;
    writeln!(out, "> {}", confidence_recommendation(result.confidence, result.severity))?;

    if !result.conditions.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Possible Conditions")?;
        writeln!(out)?;
        for (i, condition) in result.conditions.iter().enumerate() {
            write_condition(out, i + 1, condition, result.severity)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "## Symptoms Detected")?;
    writeln!(out)?;
    writeln!(out, "{}", format_symptoms_list(&result.symptoms))?;

    writeln!(out)?;
    writeln!(out, "## Treatments")?;
    writeln!(out)?;
    writeln!(out, "{}", format_treatments_text(&result.treatments))?;
    if !result.treatments.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", treatment_timeline(&result.treatments))?;
    }

    if let Some(primary) = result.primary() {
        if matches!(result.severity, Severity::High | Severity::Critical) {
            writeln!(out)?;
            writeln!(
                out,
                "{}",
                emergency_response(result.severity, &primary.name, primary.category)
            )?;
        }
    }

    if !result.immediate_actions.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Immediate Actions")?;
        writeln!(out)?;
        for action in &result.immediate_actions {
            writeln!(out, "- {}", action)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "## Prevention")?;
    writeln!(out)?;
    writeln!(out, "{}", format_prevention_tips(&result.prevention_tips))?;

    writeln!(out)?;
    writeln!(out, "{}", care_checklist(result))?;
    Ok(())
}

fn write_condition(
    out: &mut String,
    rank: usize,
    condition: &ScoredCondition,
    severity: Severity,
) -> std::fmt::Result {
    write!(
        out,
        "{}. **{}** ({} confidence, {})",
        rank,
        condition.display_name(),
        percent(condition.confidence),
        condition.category.as_str()
    )?;
    if let Some(note) = &condition.note {
        write!(out, " _{}_", note)?;
    }
    writeln!(out)?;

    if !condition.record.description.is_empty() {
        writeln!(out, "   {}", condition.record.description)?;
    }
    if condition.is_healthy() {
        return Ok(());
    }

    let recovery = recovery_stage(severity)
        .and_then(|stage| condition.record.recovery_for(stage))
        .unwrap_or_else(|| estimate_recovery_time(severity, condition.category));
    writeln!(out, "   Expected recovery: {}", recovery)
}
