//! List models command

use std::path::PathBuf;

use anyhow::Result;

use crate::config::AppConfig;

use super::load_registry;

/// List configured models
pub async fn list(config: Option<PathBuf>, verbose: bool) -> Result<()> {
    let config = AppConfig::resolve(config)?;
    let registry = load_registry(&config)?;

    if registry.is_empty() {
        println!("No models configured.");
        return Ok(());
    }

    println!("Models:\n");
    for descriptor in registry.get_models() {
        println!(
            "  {} ({} v{}.{})",
            descriptor.qualified_name,
            descriptor.display_name,
            descriptor.major_version,
            descriptor.minor_version
        );

        if verbose {
            println!("    {}", descriptor.description);
            let inputs: Vec<String> = descriptor
                .input_schema
                .properties
                .iter()
                .map(|(name, property)| format!("{}: {}", name, property.kind))
                .collect();
            println!("    Input: {}", inputs.join(", "));
            let outputs: Vec<String> = descriptor
                .output_schema
                .properties
                .iter()
                .map(|(name, property)| format!("{}: {}", name, property.kind))
                .collect();
            println!("    Output: {}", outputs.join(", "));
            println!();
        }
    }

    Ok(())
}
