//! MagicKnob CLI
//!
//! Offline front end for the MagicKnob models.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use magicknob::cli::commands::{self, RenderSettings};
use magicknob::cli::{Cli, Commands};
use magicknob::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?
            .with_env_overrides(),
        None => Config::from_env(),
    };
    if let Some(dir) = &cli.model_dir {
        config.model_dir = dir.clone();
    }

    // RUST_LOG wins over the config; --verbose wins over both
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("MagicKnob v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("MagicKnob v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &Config) -> anyhow::Result<()> {
    match cmd {
        Commands::Models => commands::list_models(config)
            .with_context(|| format!("failed to scan {}", config.model_dir.display())),
        Commands::Render {
            input,
            output,
            dist,
            lpf,
            dist_model,
            lpf_model,
            bit_depth,
            bypass,
        } => {
            let settings = RenderSettings {
                dist,
                lpf,
                dist_model,
                lpf_model,
                bit_depth,
                bypass,
            };
            commands::render(config, &input, &output, settings)
                .with_context(|| format!("failed to render {}", input.display()))
        }
        Commands::Fit {
            samples,
            iterations,
            steps,
        } => commands::fit(config, &samples, iterations, steps)
            .with_context(|| format!("failed to fit {}", samples.display())),
    }
}
