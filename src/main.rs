//! IntSights IOC lookup CLI.

use anyhow::{Context, Result};
use clap::Parser;
use intsights_ioc_lookup::{Config, Entity, IntegrationOptions, Integration};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "intsights-ioc-lookup")]
#[command(about = "Enrich indicators of compromise against the IntSights threat intelligence API")]
#[command(version)]
struct Args {
    /// IOC values to look up
    values: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "intsights.yaml")]
    config: PathBuf,

    /// JSON file holding an array of entities (objects with a "value" field)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Logs go to stderr so stdout stays machine readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    info!(config = %args.config.display(), "Loading configuration");
    let config = Config::load(&args.config)?;

    // Handle --validate
    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    // Gather entities from --input and positional values
    let entities = collect_entities(&args)?;
    if entities.is_empty() {
        anyhow::bail!("no entities given: pass IOC values or --input <FILE>");
    }

    // Resolve credentials
    let options = IntegrationOptions::from(&config.credentials)
        .credentials()
        .map_err(|errors| {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            anyhow::anyhow!(messages.join(" "))
        })?;

    // Build the shared transport
    let integration = Integration::startup(&config.request)?;

    // Run the batch and print results or the error envelope
    info!(entities = entities.len(), "Looking up entities");
    match integration.lookup(&entities, &options).await {
        Ok(results) => {
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.envelope())?);
            Err(e.into())
        }
    }
}

fn collect_entities(args: &Args) -> Result<Vec<Entity>> {
    let mut entities = match &args.input {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<Vec<Entity>>(&content)
                .with_context(|| format!("invalid entity list in {}", path.display()))?
        }
        None => Vec::new(),
    };

    entities.extend(args.values.iter().map(Entity::new));
    Ok(entities)
}
