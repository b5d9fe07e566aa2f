//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::BridgeConfig;
use tracing::info;

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args)?;

    // Apply CLI overrides
    if let Some(ref device) = args.device {
        info!(device = %device, "Overriding serial device from CLI");
        config.device.port = Some(device.clone());
    }
    if !args.outputs.is_empty() {
        info!(outputs = ?args.outputs, "Overriding outputs from CLI");
        config.outputs = args.outputs.clone();
    }
    if !args.tags.is_empty() {
        config.tags.extend(args.tags.iter().cloned());
    }

    // Re-check after overrides
    config_loader::validate(&config).context("Configuration invalid after CLI overrides")?;

    info!(
        outputs = ?config.outputs,
        tags = ?config.tags,
        device = ?config.device.port,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        config,
        buffer_size: args.buffer_size as usize,
    });

    info!("Starting bridge...");
    pipeline.run().await.context("Bridge execution failed")?;

    info!("CO2 Bridge finished");
    Ok(())
}

/// Load the configuration file, falling back to defaults when the file is
/// absent but the CLI supplies the output list.
fn load_config(args: &RunArgs) -> Result<BridgeConfig> {
    if args.config.exists() {
        info!(config = %args.config.display(), "Loading configuration");
        return config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()));
    }
    if !args.outputs.is_empty() {
        info!("No configuration file, using defaults with CLI outputs");
        return Ok(BridgeConfig::default());
    }
    anyhow::bail!("Configuration file not found: {}", args.config.display());
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &BridgeConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Device:");
    println!(
        "  Port: {}",
        config.device.port.as_deref().unwrap_or("(USB discovery)")
    );
    println!("  Baud: {}", config.device.baud);
    println!("  Read timeout: {}s", config.device.read_timeout_secs);

    println!("\nOutputs ({}):", config.outputs.len());
    for output in &config.outputs {
        println!("  - {output}");
    }

    if !config.tags.is_empty() {
        println!("\nTags: {:?}", config.tags);
    }

    println!();
}
