//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::ShufflerBlueprint;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    dispatch: DispatchInfo,
    analyzer: AnalyzerInfo,
}

#[derive(Serialize)]
struct DispatchInfo {
    threshold: u32,
    frequency_in_hours: u32,
    disposal_age_days: u32,
    batch_size: usize,
    pacing_delay_ms: u64,
    min_wait_secs: u64,
    delivery: String,
}

#[derive(Serialize)]
struct AnalyzerInfo {
    url: String,
    enable_tls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ca_file: Option<String>,
    timeout_secs: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{json}");
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &ShufflerBlueprint) -> ConfigInfo {
    let dispatch = &blueprint.dispatch;
    let analyzer = &blueprint.analyzer;

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        dispatch: DispatchInfo {
            threshold: dispatch.threshold,
            frequency_in_hours: dispatch.frequency_in_hours,
            disposal_age_days: dispatch.disposal_age_days,
            batch_size: dispatch.batch_size,
            pacing_delay_ms: dispatch.pacing_delay_ms,
            min_wait_secs: dispatch.min_wait_secs,
            delivery: format!("{:?}", dispatch.delivery),
        },
        analyzer: AnalyzerInfo {
            url: analyzer.url.clone(),
            enable_tls: analyzer.enable_tls,
            ca_file: analyzer
                .ca_file
                .as_ref()
                .map(|p| p.display().to_string()),
            timeout_secs: analyzer.timeout_secs,
        },
    }
}

fn print_config_info(blueprint: &ShufflerBlueprint) {
    let dispatch = &blueprint.dispatch;
    let analyzer = &blueprint.analyzer;

    println!("Shuffler Dispatcher Configuration ({:?})", blueprint.version);

    println!("\nDispatch");
    println!("   ├─ Threshold: {} observations", dispatch.threshold);
    println!("   ├─ Frequency: every {} h", dispatch.frequency_in_hours);
    println!("   ├─ Disposal age: {} days", dispatch.disposal_age_days);
    println!("   ├─ Batch size: {}", dispatch.batch_size);
    println!("   ├─ Pacing delay: {} ms", dispatch.pacing_delay_ms);
    println!("   ├─ Minimum wait: {} s", dispatch.min_wait_secs);
    println!("   └─ Delivery: {:?}", dispatch.delivery);

    println!("\nAnalyzer");
    println!("   ├─ URL: {}", analyzer.url);
    match &analyzer.ca_file {
        Some(ca) => {
            println!("   ├─ TLS: {}", analyzer.enable_tls);
            println!("   ├─ CA file: {}", ca.display());
        }
        None => println!("   ├─ TLS: {}", analyzer.enable_tls),
    }
    println!("   └─ Timeout: {} s", analyzer.timeout_secs);
}
