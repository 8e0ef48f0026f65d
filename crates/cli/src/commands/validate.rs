//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{DeliveryPolicy, ShufflerBlueprint};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    threshold: u32,
    frequency_in_hours: u32,
    disposal_age_days: u32,
    analyzer_url: String,
    enable_tls: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&blueprint),
            summary: Some(ConfigSummary {
                version: format!("{:?}", blueprint.version),
                threshold: blueprint.dispatch.threshold,
                frequency_in_hours: blueprint.dispatch.frequency_in_hours,
                disposal_age_days: blueprint.dispatch.disposal_age_days,
                analyzer_url: blueprint.analyzer.url.clone(),
                enable_tls: blueprint.analyzer.enable_tls,
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ShufflerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let dispatch = &blueprint.dispatch;

    if dispatch.threshold == 0 {
        warnings.push("dispatch.threshold is 0 - every group is dispatched every cycle".to_string());
    }
    if dispatch.frequency_in_hours == 0 {
        warnings.push(format!(
            "dispatch.frequency_in_hours is 0 - cycles run every {} s",
            dispatch.min_wait_secs
        ));
    }
    if dispatch.disposal_age_days == 0 {
        warnings.push(
            "dispatch.disposal_age_days is 0 - sub-threshold items older than today are dropped"
                .to_string(),
        );
    }
    if dispatch.delivery == DeliveryPolicy::AtMostOnce {
        warnings.push(
            "dispatch.delivery is at_most_once - batches that fail to send are lost".to_string(),
        );
    }
    if !blueprint.analyzer.enable_tls {
        warnings.push("analyzer.enable_tls is false - plaintext connection".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Threshold: {}", summary.threshold);
            println!("  Frequency: {} h", summary.frequency_in_hours);
            println!("  Disposal age: {} days", summary.disposal_age_days);
            println!("  Analyzer: {} (tls: {})", summary.analyzer_url, summary.enable_tls);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
