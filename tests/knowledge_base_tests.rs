//! Knowledge base replacement tests
//!
//! Loads a small custom table from disk through `AnalyzerConfig` and runs
//! the analyzer over it.

use std::path::PathBuf;
use std::sync::Arc;

use plant_diagnosis_rust::knowledge_base::Season;
use plant_diagnosis_rust::{AnalyzerConfig, KnowledgeBase, PlantHealthAnalyzer, Severity};

const CUSTOM_KB: &str = r#"{
  "conditions": {
    "sudden_collapse": {
      "name": "Sudden Collapse",
      "symptoms": ["collapse", "wilting"],
      "keywords": ["collapse", "seedling"],
      "description": "Seedlings fall over at the soil line",
      "treatments": [
        {"type": "emergency", "action": "Isolate the tray", "details": ["Move away from healthy seedlings"]},
        {"type": "cultural", "action": "Reduce watering"}
      ],
      "prevention": ["Use sterile potting mix"],
      "common_plants": ["Basil"],
      "recovery_time": {"any": "1-2 weeks"}
    },
    "broken_entry": {
      "name": "Missing symptom list"
    }
  },
  "general_advice": {
    "preventive": ["Keep tools clean"],
    "moderate": ["Check daily"]
  },
  "plant_specific_advice": {
    "Basil": {"common_issues": ["sudden_collapse"], "care_tips": ["Pinch flowers"]}
  }
}"#;

fn write_custom_kb(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}_{}.json", name, std::process::id()));
    std::fs::write(&path, CUSTOM_KB).unwrap();
    path
}

#[test]
fn test_custom_knowledge_base_from_config() {
    let path = write_custom_kb("plant_kb_config");
    let config = AnalyzerConfig {
        season: Some(Season::Spring),
        knowledge_base_path: Some(path.clone()),
    };

    let kb = config.load_knowledge_base().unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(kb.len(), 1);
    assert!(kb.get("broken_entry").is_none());
    assert_eq!(kb.emergency_conditions().len(), 1);
    assert_eq!(kb.plant_care_tips("basil"), ["Pinch flowers".to_string()]);
    assert!(kb.seasonal_advice(Season::Spring).is_empty());
}

#[test]
fn test_named_emergency_condition_is_critical() {
    let kb = Arc::new(KnowledgeBase::from_json_str(CUSTOM_KB).unwrap());
    let analyzer = PlantHealthAnalyzer::with_config(kb, AnalyzerConfig::with_season(Season::Spring));

    let result = analyzer.process_analysis(
        "The seedling shows sudden collapse at the soil line.",
        "comprehensive",
        "basil",
    );

    assert_eq!(result.severity, Severity::Critical);
    assert_eq!(result.conditions[0].name, "sudden_collapse");
    assert_eq!(result.conditions[0].display_name(), "Sudden Collapse");
}

#[test]
fn test_missing_file_is_an_error() {
    let config = AnalyzerConfig {
        season: None,
        knowledge_base_path: Some(PathBuf::from("/nonexistent/plant_kb.json")),
    };
    let err = config.load_knowledge_base().unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read knowledge base file"));
}
