//! `run` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use buffer_store::MemoryStore;
use config_loader::ConfigLoader;
use contracts::{AnalyzerTransport, BufferStore, DispatchPolicy, ShufflerBlueprint};
use dispatcher::{DispatchMetrics, DispatcherBuilder, GrpcAnalyzerTransport, Launcher, LogTransport};

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_dispatcher(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if apply_overrides(&mut blueprint, args) {
        ConfigLoader::validate(&blueprint).context("Configuration invalid after CLI overrides")?;
    }

    info!(
        threshold = blueprint.dispatch.threshold,
        frequency_in_hours = blueprint.dispatch.frequency_in_hours,
        disposal_age_days = blueprint.dispatch.disposal_age_days,
        analyzer = %blueprint.analyzer.url,
        tls = blueprint.analyzer.enable_tls,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let store = MemoryStore::new();
    if let Some(ref seed) = args.seed {
        let loaded = store
            .load_seed(seed)
            .map_err(|e| CliError::seed(seed.display().to_string(), e.to_string()))?;
        info!(seed = %seed.display(), items = loaded, "Seeded buffer");
    }
    let keys = store.list_keys().await?.len();
    observability::record_buffer_depth(keys, store.total_items());

    if args.log_only {
        info!("Log-only mode - batches will not be sent to the analyzer");
        return serve(blueprint.dispatch, store, LogTransport::new("log")).await;
    }

    let transport = GrpcAnalyzerTransport::connect(blueprint.analyzer.clone())
        .await
        .map_err(|e| CliError::analyzer_connection(&blueprint.analyzer.url, e.to_string()))?;
    serve(blueprint.dispatch, store, transport).await
}

/// Apply CLI overrides; returns whether anything changed
fn apply_overrides(blueprint: &mut ShufflerBlueprint, args: &RunArgs) -> bool {
    let mut changed = false;
    if let Some(ref url) = args.analyzer_url {
        info!(url = %url, "Overriding analyzer URL from CLI");
        blueprint.analyzer.url = url.clone();
        changed = true;
    }
    if let Some(tls) = args.analyzer_tls {
        info!(tls, "Overriding analyzer TLS from CLI");
        blueprint.analyzer.enable_tls = tls;
        changed = true;
    }
    changed
}

/// Launch the dispatcher and wait for it to fail or for a shutdown signal
async fn serve<T>(policy: DispatchPolicy, store: MemoryStore, transport: T) -> Result<()>
where
    T: AnalyzerTransport + Send + 'static,
{
    let metrics = Arc::new(DispatchMetrics::new());
    let dispatcher = DispatcherBuilder::new(policy)
        .store(store)
        .transport(transport)
        .metrics(metrics.clone())
        .build()
        .map_err(CliError::from)?;

    let mut launcher = Launcher::new();
    let mut handle = launcher.launch(dispatcher).map_err(CliError::from)?;

    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        joined = &mut handle => {
            match joined {
                Ok(Ok(())) => info!("Dispatcher finished"),
                Ok(Err(e)) => return Err(CliError::from(e).into()),
                Err(e) => return Err(CliError::shutdown(e.to_string()).into()),
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping dispatcher...");
            handle.abort();
        }
    }

    let snapshot = metrics.snapshot();
    info!(
        cycles = snapshot.cycles,
        batches_sent = snapshot.batches_sent,
        batches_failed = snapshot.batches_failed,
        items_dispatched = snapshot.items_dispatched,
        items_discarded = snapshot.items_discarded,
        "Shuffler dispatcher stopped"
    );
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &ShufflerBlueprint) {
    let dispatch = &blueprint.dispatch;
    println!("\n=== Configuration Summary ===\n");
    println!("Dispatch:");
    println!("  Threshold: {}", dispatch.threshold);
    println!("  Frequency: every {} h", dispatch.frequency_in_hours);
    println!("  Disposal age: {} days", dispatch.disposal_age_days);
    println!("  Batch size: {}", dispatch.batch_size);
    println!("  Delivery: {:?}", dispatch.delivery);
    println!("\nAnalyzer:");
    println!("  URL: {}", blueprint.analyzer.url);
    println!("  TLS: {}", blueprint.analyzer.enable_tls);
    if let Some(ref ca) = blueprint.analyzer.ca_file {
        println!("  CA file: {}", ca.display());
    }
    println!();
}
