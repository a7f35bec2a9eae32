use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::filter::LevelFilter;

use zconvert::exposes;
use zconvert::from_zigbee;
use zconvert::to_zigbee;
use zconvert::AttributeEvent;
use zconvert::Config;
use zconvert::ConfigValue;
use zconvert::DeviceDefinition;
use zconvert::LogLevel;
use zconvert::Registry;

const DEFAULT_CONFIG_PATH: &str = "zconvert.toml";

#[derive(Parser)]
#[command(name = "zconvert")]
#[command(about = "Translate between zigbee attribute traffic and device properties")]
struct Cli {
    /// Configuration file; a missing default file is not an error
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known device models
    Devices,
    /// Print the feature list of a model as JSON
    Exposes {
        model: String,
    },
    /// Decode an attribute event (JSON) into a property patch
    Decode {
        model: String,
        event: String,
    },
    /// Encode a property command into the request the device needs
    Encode {
        model: String,
        property: String,

        /// Label, or a JSON number (fraction truncated); omit with --read
        #[arg(required_unless_present = "read")]
        value: Option<String>,

        /// Build the refresh read instead of a set
        #[arg(long)]
        read: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::from_file(DEFAULT_CONFIG_PATH)
                .with_context(|| format!("loading config {}", DEFAULT_CONFIG_PATH))
        }
        None => Ok(Config::default()),
    }
}

fn find(registry: &Registry, model: &str) -> anyhow::Result<Arc<DeviceDefinition>> {
    registry
        .find(model)
        .with_context(|| format!("unknown device model {}", model))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let level = cli.log_level.unwrap_or(config.logging.level);
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(level))
        .with_writer(std::io::stderr)
        .init();

    let registry = config.registry()?;

    match cli.command {
        Commands::Devices => {
            for model in registry.models() {
                println!("{}", model);
            }
        }
        Commands::Exposes { model } => {
            let definition = find(&registry, &model)?;
            let features = exposes::exposes(&definition);
            println!("{}", serde_json::to_string_pretty(&features)?);
        }
        Commands::Decode { model, event } => {
            let definition = find(&registry, &model)?;
            let event: AttributeEvent =
                serde_json::from_str(&event).context("parsing attribute event")?;
            let patch = from_zigbee::convert(&definition.router, &event)?;
            println!("{}", serde_json::to_string_pretty(&patch)?);
        }
        Commands::Encode {
            model,
            property,
            value,
            read,
        } => {
            let definition = find(&registry, &model)?;
            let routed = match (read, value) {
                (true, _) => to_zigbee::encode_get(&definition.router, &property)?,
                (false, Some(value)) => to_zigbee::encode_set(
                    &definition.router,
                    &property,
                    &ConfigValue::from_arg(&value),
                )?,
                (false, None) => anyhow::bail!("a value is required unless --read is given"),
            };
            tracing::info!(
                "{}: {} routes to endpoint {}",
                model,
                property,
                routed.endpoint
            );
            println!("{}", serde_json::to_string_pretty(&routed)?);
        }
    }

    Ok(())
}
