//! Check command - validate configuration files.

use std::path::PathBuf;

use clap::Args;

use satforge::config::{ProductConfig, SystemConfig};
use satforge::provider::sim::standard_composites;

use crate::error::CliError;

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Path of the system configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,
}

/// Run the check command.
pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let system =
        SystemConfig::from_file(&args.config).map_err(|e| CliError::Config(e.to_string()))?;
    let products = ProductConfig::from_file(&system.product_config_path)
        .map_err(|e| CliError::Config(e.to_string()))?;

    println!("Satforge Configuration Check v{}", satforge::VERSION);
    println!("=================================");
    println!();
    println!("System config:  {}", args.config.display());
    println!("Product config: {}", system.product_config_path.display());
    println!("Listener tags:  {}", system.listener_tags.join(", "));
    println!();

    match &products.global_archive {
        Some(naming) => println!(
            "Global archive: {}",
            naming.directory.join(&naming.pattern).display()
        ),
        None => println!("Global archive: disabled"),
    }
    println!();

    for area in &products.areas {
        println!("Area {} (definition '{}')", area.name, area.definition);
        if let Some(naming) = &area.archive {
            println!(
                "  archive: {}",
                naming.directory.join(&naming.pattern).display()
            );
        }
        for product in &area.products {
            println!(
                "  product {} -> composite '{}' -> {}",
                product.name,
                product.composite,
                product
                    .output
                    .directory
                    .join(&product.output.pattern)
                    .display()
            );
        }
    }
    println!();

    let registry = standard_composites();
    let unknown = products.unknown_composites(&registry);
    if !unknown.is_empty() {
        println!("Unknown composites: {}", unknown.join(", "));
        return Err(CliError::Config(format!(
            "{} composite(s) missing from the built-in registry",
            unknown.len()
        )));
    }

    println!(
        "All {} products resolve against the built-in composites.",
        products.product_count()
    );
    Ok(())
}
