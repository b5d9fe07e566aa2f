//! `validate` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ValidateArgs;

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        println!("{}", config_loader::ConfigLoader::to_json(&config)?);
    } else {
        info!(
            config = %args.config.display(),
            outputs = ?config.outputs,
            "Configuration is valid"
        );
        println!("OK: {}", args.config.display());
    }

    Ok(())
}
