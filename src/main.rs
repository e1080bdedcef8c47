//! typedargs - parse arguments against a JSON registry and print them as JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use typedargs::{generate_help, generate_output_string, generate_version, Config};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TYPEDARGS_LOG";

/// Declarative, type-directed argument parsing.
#[derive(Parser, Debug)]
#[command(name = "typedargs", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the argument registry comes from.
#[derive(Args, Debug)]
struct ConfigSource {
    /// JSON registry for the target program
    #[arg(long, required_unless_present = "config_file", conflicts_with = "config_file")]
    config: Option<String>,

    /// Path to a JSON registry file
    #[arg(long)]
    config_file: Option<PathBuf>,
}

impl ConfigSource {
    fn load(&self) -> Result<Config> {
        match (&self.config, &self.config_file) {
            (Some(json), _) => Config::from_json(json).context("failed to parse config JSON"),
            (None, Some(path)) => Config::from_file(path)
                .with_context(|| format!("failed to load config file {}", path.display())),
            (None, None) => anyhow::bail!("no config given"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse arguments and print the typed values as JSON
    Parse {
        #[command(flatten)]
        source: ConfigSource,

        /// Arguments to parse for the target program
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print help text for the target program
    Help {
        #[command(flatten)]
        source: ConfigSource,
    },

    /// Print version of the target program
    Version {
        #[command(flatten)]
        source: ConfigSource,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { source, args } => {
            let cfg = source.load()?;
            let registry = cfg.to_registry().context("invalid config")?;
            let parsed = registry
                .parse(args.as_slice())
                .context("failed to parse arguments")?;
            let output = generate_output_string(&parsed).context("failed to render output")?;
            println!("{}", output);
        }
        Commands::Help { source } => {
            let cfg = source.load()?;
            let registry = cfg.to_registry().context("invalid config")?;
            print!("{}", generate_help(&cfg, &registry));
        }
        Commands::Version { source } => {
            let cfg = source.load()?;
            print!("{}", generate_version(&cfg));
        }
    }

    Ok(())
}
