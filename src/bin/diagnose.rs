//! Diagnose plant health from vision-model output.
//!
//! Usage:
//!   diagnose "The leaves show brown circular spots..." --context tomato
//!   echo "..." | diagnose --output json
//!   diagnose --batch requests.json
//!
//! Environment: PLANT_KB_PATH, PLANT_SEASON, RUST_LOG.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use plant_diagnosis_rust::report::{diagnosis_summary, format_diagnosis_report};
use plant_diagnosis_rust::{AnalysisRequest, AnalyzerConfig, DiagnosisResult, PlantHealthAnalyzer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "diagnose")]
#[command(about = "Plant health diagnosis from image-analysis text", long_about = None)]
#[command(version)]
struct Cli {
    /// Analysis text; read from stdin when omitted
    text: Option<String>,

    /// Analysis mode echoed into the result
    #[arg(short, long, default_value = "comprehensive")]
    mode: String,

    /// Plant name or description (e.g. "tomato")
    #[arg(short, long, default_value = "")]
    context: String,

    /// JSON file holding an array of requests
    #[arg(long, conflicts_with = "text")]
    batch: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "report")]
    output: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Report,
    Summary,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plant_diagnosis_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AnalyzerConfig::from_env()?;
    tracing::info!("Configuration:");
    tracing::info!("  season: {}", config.season().as_str());
    tracing::info!(
        "  knowledge base: {}",
        config
            .knowledge_base_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    );

    let kb = Arc::new(config.load_knowledge_base()?);
    let analyzer = PlantHealthAnalyzer::with_config(kb, config);

    let results = match &cli.batch {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read batch file: {:?}", path))?;
            let requests: Vec<AnalysisRequest> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse batch file: {:?}", path))?;
            analyzer.process_batch(&requests)
        }
        None => {
            let text = match &cli.text {
                Some(text) => text.clone(),
                None => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read analysis text from stdin")?;
                    buffer
                }
            };
            vec![analyzer.process_analysis(&text, &cli.mode, &cli.context)]
        }
    };

    print_results(&results, cli.output)
}

fn print_results(results: &[DiagnosisResult], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            let json = if results.len() == 1 {
                serde_json::to_string_pretty(&results[0])?
            } else {
                serde_json::to_string_pretty(results)?
            };
            println!("{}", json);
        }
        OutputFormat::Summary => {
            for result in results {
                println!("{}", diagnosis_summary(result));
            }
        }
        OutputFormat::Report => {
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    println!("\n---\n");
                }
                print!("{}", format_diagnosis_report(result)?);
            }
        }
    }
    Ok(())
}
