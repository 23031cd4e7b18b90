//! Quire - a static site generator for Markdown blogs.

mod assemble;
mod build;
mod cli;
mod config;
mod content;
mod error;
mod render;
mod taxonomy;
mod utils;

use anyhow::{Context, Result, bail};
use build::build_site;
use clap::Parser;
use cli::Cli;
use config::SiteConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log!("config"; "using {}", config.config_path.display());

    let now = chrono::Utc::now().naive_utc();
    let report = build_site(&config, now).context("Build failed")?;

    if report.items == 0 {
        log!("warn"; "no content found in {}", config.build.content.display());
    }
    let published = report.published;
    log!(
        "build";
        "{} pages ({} listings), {} files copied, {} kept in {}",
        published.pages,
        report.listings,
        published.copied,
        published.carried,
        config.build.output.display()
    );
    Ok(())
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.clone().unwrap_or_else(|| "./".into());
    let config_path = root.join(&cli.config);

    if !config_path.exists() {
        bail!("Config file not found: {}", config_path.display());
    }

    let mut config = SiteConfig::from_path(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}
